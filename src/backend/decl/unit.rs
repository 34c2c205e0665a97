//! Unit-wide setup functions.
//!
//! Every unit gets the same six global functions, prefixed with its safe name. The runtime calls `{A}__Setup`
//! once before any managed code runs and `{A}__AssemblyTrace` on every collection.

use crate::config::OutputLayout;

use super::super::Translator;
use super::super::emitter::CppEmitter;
use super::super::output::type_guard;
use super::super::state::LedgerEntry;

/// Prototypes for the definition stream and bodies for the method stream.
pub(super) struct UnitFunctions {
    pub declarations: String,
    pub definitions: String,
}

/// Writes one function into both streams.
struct FunctionWriter {
    declarations: CppEmitter,
    definitions: CppEmitter,
    guarded: bool,
}

impl FunctionWriter {
    fn function<'e>(&mut self, signature: &str, entries: impl IntoIterator<Item = Body<'e>>) {
        self.declarations.line(&format!("{};", signature));
        let guarded = self.guarded;
        self.definitions.block(signature, |e| {
            for entry in entries {
                match entry {
                    Body::Call(call) => e.line(&call),
                    Body::Entry(entry) if guarded => {
                        // Directives stay in column zero.
                        e.write(&format!("#ifndef CN_NO_{}\n", type_guard(&entry.owner)));
                        e.line(&entry.statement);
                        e.write("#endif\n");
                    }
                    Body::Entry(entry) => e.line(&entry.statement),
                }
            }
        });
    }
}

enum Body<'e> {
    Call(String),
    Entry(&'e LedgerEntry),
}

fn entries(ledger: &[LedgerEntry]) -> Vec<Body<'_>> {
    ledger.iter().map(Body::Entry).collect()
}

impl<'t, 'a> Translator<'t, 'a> {
    /// Emit `StaticConstructors`, `PopulateInterfaceMaps`, `AssemblyTrace`, `Setup`, `Teardown` and
    /// `RegisterStringPools` from the ledgers the unit's types filled.
    pub(super) fn emit_unit_functions(&mut self) -> UnitFunctions {
        let a = self.unit.safe_name.clone();
        let indent = self.config.indent;
        let mut w = FunctionWriter {
            declarations: CppEmitter::with_indent(indent),
            definitions: CppEmitter::with_indent(indent),
            guarded: self.config.layout == OutputLayout::FilePerType,
        };

        w.function(&format!("void {}__StaticConstructors()", a), entries(&self.unit.static_ctors));
        w.function(&format!("void {}__PopulateInterfaceMaps()", a), entries(&self.unit.interface_maps));
        w.function(
            &format!("void {}__AssemblyTrace(unsigned char currentMark)", a),
            entries(&self.unit.assembly_trace),
        );
        w.function(
            &format!("void {}__Setup()", a),
            ["PopulateInterfaceMaps", "RegisterStringPools", "StaticConstructors"]
                .map(|f| Body::Call(format!("{}__{}();", a, f))),
        );
        w.function(&format!("void {}__Teardown()", a), []);
        w.function(
            &format!("void {}__RegisterStringPools()", a),
            self.unit.pool.registrations().into_iter().map(Body::Call),
        );
        tracing::debug!(
            static_ctors = self.unit.static_ctors.len(),
            interface_maps = self.unit.interface_maps.len(),
            strings = self.unit.pool.len(),
            "emitted unit functions"
        );

        let mut definitions = w.definitions;
        definitions.blank_line();
        UnitFunctions {
            declarations: w.declarations.finish(),
            definitions: definitions.finish(),
        }
    }
}
