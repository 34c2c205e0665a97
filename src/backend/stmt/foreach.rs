//! `foreach` lowering.
//!
//! The enumeration source is picked in this order:
//! 1. single-dimension arrays: an index loop over `get_Length()`, no enumerator
//! 2. a public `GetEnumerator()` declared on the collection's own static type
//! 3. `IEnumerable<T>` among the collection's interfaces
//! 4. the untyped `IEnumerable`
//!
//! `MoveNext()` and `get_Current()` go through an interface call only when the type declaring them is an
//! interface; when that type differs from the enumerator type the enumerator is cast into a temporary first.

use nativize_core::lang::runtime;
use nativize_model::{Block, Expr, MethodDecl, TypeRef, VariableDecl};

use super::super::Translator;
use super::super::context::{PropertyMode, TranslationContext};
use super::super::emitter::CppEmitter;
use super::super::errors::TranslateResult;
use super::super::local_name;
use super::super::text::AnnotatedText;
use super::{flush, interface_call};

const GENERIC_ENUMERABLE: &str = "System.Collections.Generic.IEnumerable`1";
const ENUMERABLE: &str = "System.Collections.IEnumerable";
const ENUMERATOR: &str = "System.Collections.IEnumerator";
const DISPOSABLE: &str = "System.IDisposable";

/// Where the enumerator comes from.
enum Source {
    /// `GetEnumerator()` on the collection's own type.
    Direct { enumerator: TypeRef },
    /// `GetEnumerator()` through an enumerable interface.
    Interface { enumerable: TypeRef, enumerator: TypeRef },
}

impl<'t, 'a> Translator<'t, 'a> {
    pub(super) fn translate_foreach(
        &mut self,
        cx: &mut TranslationContext,
        variable: &VariableDecl,
        collection: &Expr,
        body: &Block,
        out: &mut CppEmitter,
    ) -> TranslateResult<()> {
        let source = {
            let mut g = cx.push_property_mode(PropertyMode::Get);
            self.translate_expr(&mut g, collection)?
        };
        flush(cx, out);

        let variable_slot = match self.captured_slot(cx, &variable.name) {
            Some(slot) => slot,
            None => {
                cx.declare_local(&variable.name, variable.ty.clone());
                format!("{} {}", self.local_type(cx, &variable.ty), local_name(&variable.name))
            }
        };

        out.line("{");
        out.indent();
        if let TypeRef::Array { element, rank: 1 } = &source.ty {
            self.foreach_array(cx, variable, &variable_slot, &source, element, body, out)?;
        } else {
            self.foreach_enumerator(cx, variable, &variable_slot, collection, &source, body, out)?;
        }
        out.dedent();
        out.line("}");
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn foreach_array(
        &mut self,
        cx: &mut TranslationContext,
        variable: &VariableDecl,
        slot: &str,
        source: &AnnotatedText,
        element: &TypeRef,
        body: &Block,
        out: &mut CppEmitter,
    ) -> TranslateResult<()> {
        let array = self.unit.next_temp();
        let length = self.unit.next_temp();
        let index = self.unit.next_temp();
        out.line(&format!("{} {} = {};", self.local_type(cx, &source.ty), array, source.text));
        out.line(&format!("::System::Int32 {} = {}->get_Length();", length, array));
        out.line(&format!(
            "for (::System::Int32 {} = 0 ; {} < {} ; ++{})",
            index, index, length, index
        ));
        out.line("{");
        out.indent();
        let item = AnnotatedText::new(format!("{}->Item({})", array, index), element.clone());
        let item = self.convert(cx, &variable.ty, item);
        out.line(&format!("{} = {};", slot, item.text));
        self.translate_block(cx, body, out)?;
        out.dedent();
        out.line("}");
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn foreach_enumerator(
        &mut self,
        cx: &mut TranslationContext,
        variable: &VariableDecl,
        slot: &str,
        collection: &Expr,
        source: &AnnotatedText,
        body: &Block,
        out: &mut CppEmitter,
    ) -> TranslateResult<()> {
        let (it, enumerator) = match self.enumeration_source(&source.ty) {
            Source::Direct { enumerator } => {
                let it = self.unit.next_temp();
                let call = if matches!(collection, Expr::Base) {
                    format!("{}::GetEnumerator()", self.names(cx).type_name(&source.ty))
                } else {
                    format!("{}{}GetEnumerator()", source.text, self.table.member_access(&source.ty))
                };
                out.line(&format!("{} {} = {};", self.local_type(cx, &enumerator), it, call));
                (it, enumerator)
            }
            Source::Interface { enumerable, enumerator } => {
                let holder = self.unit.next_temp();
                let value = self.convert(cx, &enumerable, source.clone());
                out.line(&format!("{} {} = {};", self.local_type(cx, &enumerable), holder, value.text));
                let it = self.unit.next_temp();
                let iface = self.names(cx).type_name(&enumerable);
                out.line(&format!(
                    "{} {} = {};",
                    self.local_type(cx, &enumerator),
                    it,
                    interface_call(&holder, &iface, "GetEnumerator", &[])
                ));
                (it, enumerator)
            }
        };

        let move_next = self.enumerator_member(cx, &it, &enumerator, "MoveNext", out);
        let current = self.enumerator_member(cx, &it, &enumerator, "get_Current", out);
        let current_type = self
            .table
            .find_method(&enumerator, "get_Current", 0)
            .or_else(|| self.interface_method(&enumerator, "get_Current"))
            .and_then(|(owner, m)| m.return_type.as_ref().map(|r| r.substitute(owner.args(), &[])))
            .unwrap_or_else(TypeRef::object);

        out.line(&format!("while ({})", move_next));
        out.line("{");
        out.indent();
        let item = self.convert(cx, &variable.ty, AnnotatedText::new(current, current_type));
        out.line(&format!("{} = {};", slot, item.text));
        self.translate_block(cx, body, out)?;
        out.dedent();
        out.line("}");

        self.dispose_enumerator(cx, &it, &enumerator, out);
        Ok(())
    }

    fn enumeration_source(&self, ty: &TypeRef) -> Source {
        if let Some(m) = self.table.own_public_method(ty, "GetEnumerator") {
            let enumerator = m
                .return_type
                .as_ref()
                .map(|r| r.substitute(ty.args(), &[]))
                .unwrap_or_else(|| TypeRef::named(ENUMERATOR));
            if self.table.is_interface(ty) {
                return Source::Interface {
                    enumerable: ty.clone(),
                    enumerator,
                };
            }
            return Source::Direct { enumerator };
        }
        if let Some(enumerable) = self.table.find_interface(ty, GENERIC_ENUMERABLE) {
            let enumerator = self
                .table
                .find_method(&enumerable, "GetEnumerator", 0)
                .and_then(|(owner, m)| m.return_type.as_ref().map(|r| r.substitute(owner.args(), &[])))
                .unwrap_or_else(|| TypeRef::named(ENUMERATOR));
            return Source::Interface { enumerable, enumerator };
        }
        Source::Interface {
            enumerable: TypeRef::named(ENUMERABLE),
            enumerator: TypeRef::named(ENUMERATOR),
        }
    }

    /// The interface among `ty`'s interfaces declaring `name`.
    fn interface_method(&self, ty: &TypeRef, name: &str) -> Option<(TypeRef, &'a MethodDecl)> {
        self.table
            .union_of(ty)
            .into_iter()
            .find_map(|i| self.table.find_method(&i, name, 0))
    }

    /// Type declaring `name` as seen from the enumerator: the enumerator itself, a base, or one of its interfaces.
    fn declaring_owner(&self, enumerator: &TypeRef, name: &str) -> TypeRef {
        self.table
            .find_method(enumerator, name, 0)
            .or_else(|| self.interface_method(enumerator, name))
            .map(|(owner, _)| owner)
            .unwrap_or_else(|| enumerator.clone())
    }

    /// Call text for a parameterless enumerator member, casting into a temporary when an ancestor interface
    /// declares it.
    fn enumerator_member(
        &mut self,
        cx: &TranslationContext,
        it: &str,
        enumerator: &TypeRef,
        name: &str,
        out: &mut CppEmitter,
    ) -> String {
        let owner = self.declaring_owner(enumerator, name);
        let object = if &owner != enumerator && self.table.is_interface(&owner) {
            let temp = self.unit.next_temp();
            let cast = self.convert(cx, &owner, AnnotatedText::new(it, enumerator.clone()));
            out.line(&format!("{} {} = {};", self.local_type(cx, &owner), temp, cast.text));
            temp
        } else {
            it.to_string()
        };
        if self.table.is_interface(&owner) {
            let iface = self.names(cx).type_name(&owner);
            interface_call(&object, &iface, name, &[])
        } else {
            format!("{}{}{}()", object, self.table.member_access(enumerator), name)
        }
    }

    /// Dispose the enumerator after the loop. Statically disposable enumerators are disposed directly; other
    /// reference enumerators are disposed when they turn out to be disposable at run time.
    fn dispose_enumerator(&mut self, cx: &TranslationContext, it: &str, enumerator: &TypeRef, out: &mut CppEmitter) {
        let disposable = TypeRef::named(DISPOSABLE);
        let iface = self.names(cx).type_name(&disposable);
        if self.table.is_value_type(enumerator) {
            if self.table.implements(enumerator, DISPOSABLE) {
                out.line(&format!("{}.Dispose();", it));
            }
            return;
        }
        if self.table.implements(enumerator, DISPOSABLE) {
            let call = if self.table.is_interface(enumerator) {
                interface_call(it, &iface, "Dispose", &[])
            } else {
                format!("{}->Dispose()", it)
            };
            out.line(&format!("if ({} != NULL)", it));
            out.block("", |e| e.line(&format!("{};", call)));
            return;
        }
        let temp = self.unit.next_temp();
        out.line(&format!(
            "{} * {} = {}<{} >({});",
            iface,
            temp,
            runtime::AS_CAST,
            iface,
            it
        ));
        out.line(&format!("if ({} != NULL)", temp));
        out.block("", |e| e.line(&format!("{};", interface_call(&temp, &iface, "Dispose", &[]))));
    }
}

#[cfg(test)]
mod tests {
    use nativize_model::Stmt;

    use super::super::tests::{body, cx};
    use super::*;

    fn foreach(collection: &str, variable: TypeRef) -> Block {
        Block::new(vec![Stmt::ForEach {
            variable: VariableDecl::new("x", variable),
            collection: Expr::var(collection),
            body: Block::default(),
        }])
    }

    #[test]
    fn test_array_uses_an_index_loop() {
        let mut cx = cx();
        cx.declare_local("items", TypeRef::array(TypeRef::int32()));
        insta::assert_snapshot!(body(&mut cx, foreach("items", TypeRef::int32())), @r"
        {
            {
                ::System::Array__G< ::System::Int32 > * __temp0__ = items;
                ::System::Int32 __temp1__ = __temp0__->get_Length();
                for (::System::Int32 __temp2__ = 0 ; __temp2__ < __temp1__ ; ++__temp2__)
                {
                    ::System::Int32 x = __temp0__->Item(__temp2__);
                    {
                    }
                }
            }
        }
        ");
    }

    #[test]
    fn test_public_enumerator_method_needs_one_temporary() {
        let mut cx = cx();
        cx.declare_local("items", TypeRef::named("App.Items"));
        let text = body(&mut cx, foreach("items", TypeRef::int32()));
        assert!(text.contains("::App::Items__Enumerator __temp0__ = items->GetEnumerator();"), "{}", text);
        assert!(text.contains("while (__temp0__.MoveNext())"), "{}", text);
        assert!(text.contains("::System::Int32 x = __temp0__.get_Current();"), "{}", text);
        assert!(!text.contains("__temp1__"));
        assert!(!text.contains("INTERFACE__CALL"));
    }

    #[test]
    fn test_generic_enumerable_goes_through_interfaces() {
        let mut cx = cx();
        cx.declare_local("bag", TypeRef::named("App.Bag"));
        let text = body(&mut cx, foreach("bag", TypeRef::int32()));
        assert!(
            text.contains(
                "::System::Collections::Generic::IEnumerable__G1<::System::Int32 > * __temp0__ = ::CrossNetRuntime::InterfaceCast<::System::Collections::Generic::IEnumerable__G1<::System::Int32 > >(bag);"
            ),
            "{}",
            text
        );
        assert!(text.contains("INTERFACE__CALL(__temp0__, ::System::Collections::Generic::IEnumerable__G1<::System::Int32 >)->GetEnumerator(__temp0__)"));
        assert!(text.contains("while (INTERFACE__CALL(__temp2__, ::System::Collections::IEnumerator)->MoveNext(__temp2__))"));
        assert!(text.contains("INTERFACE__CALL(__temp1__, ::System::Collections::Generic::IEnumerator__G1<::System::Int32 >)->get_Current(__temp1__)"));
        assert!(text.contains("if (__temp1__ != NULL)"));
        assert!(text.contains("INTERFACE__CALL(__temp1__, ::System::IDisposable)->Dispose(__temp1__);"));
    }

    #[test]
    fn test_untyped_enumerable_disposes_when_disposable_at_run_time() {
        let mut cx = cx();
        cx.declare_local("any", TypeRef::object());
        let text = body(&mut cx, foreach("any", TypeRef::object()));
        assert!(text.contains("::System::Collections::IEnumerable * __temp0__"), "{}", text);
        assert!(text.contains(
            "::System::IDisposable * __temp2__ = ::CrossNetRuntime::AsCast<::System::IDisposable >(__temp1__);"
        ));
    }
}
