//! Unit results and output file layout.
//!
//! A translated unit is three ordered streams: forward declarations, class definitions and method definitions.
//! [`layout`] turns them into files, either the three unit files alone or, in file-per-type mode, the unit files
//! plus one `.h`/`.cpp` pair per type.
//!
//! ## Notes
//!
//! - Every file starts with the configured banner and is wrapped in an include guard.
//! - The definition file includes the declaration file, the method file includes the definition file.
//! - In file-per-type mode each type's pair, and every unit-setup statement the type contributed, sits behind
//!   `#ifndef CN_NO_<PATH>` so a build can drop single types.

use serde::Serialize;

use nativize_model::TypeKey;

use super::diagnostics::Diagnostic;
use super::names::Names;
use crate::config::{BackendConfig, OutputLayout};

/// One generated file, named relative to the output directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputFile {
    pub name: String,
    pub contents: String,
}

/// Everything produced for one unit.
#[derive(Debug, Clone, Serialize)]
pub struct UnitOutput {
    /// Unit (assembly) name as given.
    pub unit: String,
    pub files: Vec<OutputFile>,
    pub diagnostics: Vec<Diagnostic>,
    /// Managed names of the emitted types, in emission order.
    pub emitted: Vec<String>,
    /// Types emitted by the dependency-cycle fallback.
    pub forced: Vec<String>,
}

impl UnitOutput {
    /// Contents of the file called `name`.
    pub fn file(&self, name: &str) -> Option<&str> {
        self.files.iter().find(|f| f.name == name).map(|f| f.contents.as_str())
    }

    /// Whether an error-severity diagnostic was recorded (the unit is failed even though text was produced).
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    /// Whether any type had to be force-drained out of a dependency cycle.
    pub fn has_cycles(&self) -> bool {
        !self.forced.is_empty()
    }
}

/// Generated text of one type, split over the three streams.
#[derive(Debug, Clone)]
pub(crate) struct TypeText {
    pub key: TypeKey,
    /// Forward declaration, already wrapped in its namespaces.
    pub declaration: String,
    /// Class definition, already wrapped in its namespaces.
    pub definition: String,
    /// Out-of-line member definitions at global scope.
    pub methods: String,
}

/// The unit's streams before they are split into files.
#[derive(Debug, Clone, Default)]
pub(crate) struct UnitText {
    pub unit: String,
    pub safe_name: String,
    pub types: Vec<TypeText>,
    pub pool_declarations: Vec<String>,
    pub pool_definitions: Vec<String>,
    /// Prototypes of the unit-wide setup functions.
    pub function_declarations: String,
    /// Bodies of the unit-wide setup functions.
    pub function_definitions: String,
}

/// Upper-case identifier of a type used in guards: `App.Sub.Widget` → `APP_SUB_WIDGET`.
pub(crate) fn type_guard(key: &TypeKey) -> String {
    let mut parts = Names::namespace_path(key);
    parts.push(Names::declaration_name(key));
    parts.join("_").to_uppercase()
}

/// Path of a type's own header in file-per-type mode, without extension: `App/Sub/Widget`.
pub(crate) fn type_path(key: &TypeKey) -> String {
    let mut parts = Names::namespace_path(key);
    parts.push(Names::declaration_name(key));
    parts.join("/")
}

/// Split the unit's streams into files according to the configured layout.
pub(crate) fn layout(config: &BackendConfig, text: &UnitText) -> Vec<OutputFile> {
    let declaration_name = format!("{}_class_declaration.h", text.safe_name);
    let definition_name = format!("{}_class_definition.h", text.safe_name);
    let method_name = format!("{}_method_definition.cpp", text.safe_name);
    let per_type = config.layout == OutputLayout::FilePerType;

    let mut declarations = String::new();
    for line in &text.pool_declarations {
        declarations.push_str(line);
        declarations.push('\n');
    }
    if !text.pool_declarations.is_empty() {
        declarations.push('\n');
    }
    for ty in &text.types {
        declarations.push_str(&ty.declaration);
    }

    let mut definitions = format!("#include \"{}\"\n\n", declaration_name);
    let mut methods = format!("#include \"{}\"\n\n", definition_name);
    for line in &text.pool_definitions {
        methods.push_str(line);
        methods.push('\n');
    }
    if !text.pool_definitions.is_empty() {
        methods.push('\n');
    }

    let mut files = Vec::new();
    for ty in &text.types {
        if per_type {
            let path = type_path(&ty.key);
            definitions.push_str(&format!("#include \"{}.h\"\n", path));
            files.push(type_header(config, text, ty, &declaration_name));
            files.push(type_source(config, text, ty, &definition_name));
        } else {
            definitions.push_str(&ty.definition);
            methods.push_str(&ty.methods);
        }
    }
    if per_type && !text.types.is_empty() {
        definitions.push('\n');
    }
    definitions.push_str(&text.function_declarations);
    methods.push_str(&text.function_definitions);

    let mut unit_files = vec![
        OutputFile {
            name: declaration_name.clone(),
            contents: guarded(config, &text.unit, "Class declarations", &declaration_name, &declarations),
        },
        OutputFile {
            name: definition_name.clone(),
            contents: guarded(config, &text.unit, "Class definitions", &definition_name, &definitions),
        },
        OutputFile {
            name: method_name.clone(),
            contents: guarded(config, &text.unit, "Method definitions", &method_name, &methods),
        },
    ];
    unit_files.append(&mut files);
    tracing::debug!(files = unit_files.len(), per_type, "laid out unit files");
    unit_files
}

fn type_header(config: &BackendConfig, text: &UnitText, ty: &TypeText, declaration_name: &str) -> OutputFile {
    let name = format!("{}.h", type_path(&ty.key));
    let body = format!(
        "#include \"{}\"\n\n#ifndef CN_NO_{}\n{}#endif\n",
        declaration_name,
        type_guard(&ty.key),
        ty.definition
    );
    OutputFile {
        contents: guarded(config, &text.unit, &format!("Class definition of {}", ty.key), &name, &body),
        name,
    }
}

fn type_source(config: &BackendConfig, text: &UnitText, ty: &TypeText, definition_name: &str) -> OutputFile {
    let name = format!("{}.cpp", type_path(&ty.key));
    let body = format!(
        "#include \"{}\"\n\n#ifndef CN_NO_{}\n{}#endif\n",
        definition_name,
        type_guard(&ty.key),
        ty.methods
    );
    OutputFile {
        contents: guarded(config, &text.unit, &format!("Method definitions of {}", ty.key), &name, &body),
        name,
    }
}

/// Banner comment plus include guard around `body`.
fn guarded(config: &BackendConfig, unit: &str, what: &str, file_name: &str, body: &str) -> String {
    let guard = include_guard(file_name);
    format!(
        "/*\n\t{}\n\t{} for the assembly {}\n*/\n\n#ifndef {guard}\n#define {guard}\n\n{}\n#endif\n",
        config.banner, what, unit, body
    )
}

/// `App/Sub/Widget.h` → `__APP_SUB_WIDGET_H__`.
fn include_guard(file_name: &str) -> String {
    let ident: String = file_name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
        .collect();
    format!("__{}__", ident)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_text() -> UnitText {
        UnitText {
            unit: "My.App".to_string(),
            safe_name: "My_App".to_string(),
            types: vec![TypeText {
                key: TypeKey::new("App.Sub.Widget"),
                declaration: "namespace App {\n    class Widget;\n}\n".to_string(),
                definition: "namespace App {\n    class Widget {};\n}\n".to_string(),
                methods: "void App::Sub::Widget::Run()\n{\n}\n".to_string(),
            }],
            pool_declarations: vec!["extern ::System::String * sMy_App__hi;".to_string()],
            pool_definitions: vec!["::System::String * sMy_App__hi;".to_string()],
            function_declarations: "void My_App__Setup();\n".to_string(),
            function_definitions: "void My_App__Setup()\n{\n}\n".to_string(),
        }
    }

    #[test]
    fn test_guards_and_paths() {
        let key = TypeKey::new("App.Sub.Widget");
        assert_eq!(type_guard(&key), "APP_SUB_WIDGET");
        assert_eq!(type_path(&key), "App/Sub/Widget");
        assert_eq!(include_guard("App/Sub/Widget.h"), "__APP_SUB_WIDGET_H__");
    }

    #[test]
    fn test_single_layout_has_three_chained_files() {
        let files = layout(&BackendConfig::default(), &unit_text());
        let names: Vec<&str> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["My_App_class_declaration.h", "My_App_class_definition.h", "My_App_method_definition.cpp"]
        );
        assert!(files[0].contents.starts_with("/*\n\tGenerated by nativize. Do not edit.\n\tClass declarations for the assembly My.App\n*/"));
        assert!(files[0].contents.contains("#ifndef __MY_APP_CLASS_DECLARATION_H__"));
        assert!(files[0].contents.contains("extern ::System::String * sMy_App__hi;"));
        assert!(files[1].contents.contains("#include \"My_App_class_declaration.h\""));
        assert!(files[1].contents.contains("class Widget {};"));
        assert!(files[2].contents.contains("#include \"My_App_class_definition.h\""));
        assert!(files[2].contents.contains("void App::Sub::Widget::Run()"));
        assert!(files[2].contents.contains("void My_App__Setup()"));
    }

    #[test]
    fn test_file_per_type_moves_type_text_into_its_pair() {
        let config = BackendConfig::default().with_layout(OutputLayout::FilePerType);
        let files = layout(&config, &unit_text());
        assert_eq!(files.len(), 5);
        let header = files.iter().find(|f| f.name == "App/Sub/Widget.h").unwrap();
        assert!(header.contents.contains("#ifndef CN_NO_APP_SUB_WIDGET"));
        assert!(header.contents.contains("class Widget {};"));
        let source = files.iter().find(|f| f.name == "App/Sub/Widget.cpp").unwrap();
        assert!(source.contents.contains("void App::Sub::Widget::Run()"));
        let definitions = &files[1].contents;
        assert!(definitions.contains("#include \"App/Sub/Widget.h\""));
        assert!(!definitions.contains("class Widget {};"));
        assert!(!files[2].contents.contains("Widget::Run"));
    }
}
