//! `switch` statements.
//!
//! C++ cannot switch on strings, so a string switch compares hashes: the scrutinee becomes
//! `s->::System::String::GetHashCode()` (a static call, valid on null) and every label becomes the hash of its
//! text. The `null` label uses the reserved hash 0, which no string hashes to.

use nativize_core::lang::primitives::PrimitiveId;
use nativize_core::lang::runtime;
use nativize_core::strings::switch_hash;
use nativize_model::{CaseLabel, Expr, Literal, SwitchCase};

use super::super::Translator;
use super::super::context::{PropertyMode, TranslationContext};
use super::super::emitter::CppEmitter;
use super::super::errors::TranslateResult;
use super::flush;

impl<'t, 'a> Translator<'t, 'a> {
    pub(super) fn translate_switch(
        &mut self,
        cx: &mut TranslationContext,
        value: &Expr,
        cases: &[SwitchCase],
        out: &mut CppEmitter,
    ) -> TranslateResult<()> {
        let scrutinee = {
            let mut g = cx.push_property_mode(PropertyMode::Get);
            self.translate_expr(&mut g, value)?
        };
        flush(cx, out);

        let on_string = scrutinee.ty.is_primitive(PrimitiveId::String);
        if on_string {
            out.line(&format!("switch ({}->{}::GetHashCode())", scrutinee.text, runtime::STRING_TYPE));
        } else {
            out.line(&format!("switch ({})", scrutinee.text));
        }

        let mut g = cx.push_switch_type(scrutinee.ty.clone());
        out.line("{");
        out.indent();
        for case in cases {
            for label in &case.labels {
                let text = self.case_label(&mut g, label, on_string);
                out.line(&text);
            }
            self.translate_block(&mut g, &case.body, out)?;
        }
        out.dedent();
        out.line("}");
        drop(g);
        Ok(())
    }

    fn case_label(&mut self, cx: &mut TranslationContext, label: &CaseLabel, on_string: bool) -> String {
        let value = match label {
            CaseLabel::Default => return "default:".to_string(),
            CaseLabel::Value { value } => value,
        };
        if on_string {
            match value {
                Literal::String(s) => return format!("case {}:\t\t// {}", switch_hash(s), comment_text(s)),
                Literal::Null => return "case 0:\t\t// null".to_string(),
                _ => {}
            }
        }
        let text = self.render_literal(cx, value);
        let on_char = cx.switch_type().is_some_and(|t| t.is_primitive(PrimitiveId::Char));
        if on_char && matches!(value, Literal::I32(_)) {
            return format!("case (System::Char)({}):", text.text);
        }
        format!("case {}:", text.text)
    }
}

/// Label text made safe for a line comment.
fn comment_text(s: &str) -> String {
    s.replace('\\', "\\\\").replace('\n', "\\n").replace('\r', "\\r")
}

#[cfg(test)]
mod tests {
    use nativize_model::{Block, Stmt, TypeRef};
    use proptest::prelude::*;

    use super::super::tests::{body, cx};
    use super::*;

    fn case(labels: Vec<CaseLabel>) -> SwitchCase {
        SwitchCase {
            labels,
            body: Block::new(vec![Stmt::Break]),
        }
    }

    fn value(v: Literal) -> CaseLabel {
        CaseLabel::Value { value: v }
    }

    #[test]
    fn test_string_switch_hashes_labels() {
        let mut cx = cx();
        cx.declare_local("s", TypeRef::string());
        let block = Block::new(vec![Stmt::Switch {
            value: Expr::var("s"),
            cases: vec![
                case(vec![value(Literal::String("a".into())), value(Literal::Null)]),
                case(vec![CaseLabel::Default]),
            ],
        }]);
        let text = body(&mut cx, block);
        assert!(text.contains("switch (s->::System::String::GetHashCode())"), "{}", text);
        assert!(text.contains(&format!("case {}:\t\t// a", switch_hash("a"))));
        assert!(text.contains("case 0:\t\t// null"));
        assert!(text.contains("default:"));
    }

    #[test]
    fn test_int_labels_under_a_char_switch_are_cast() {
        let mut cx = cx();
        cx.declare_local("c", TypeRef::char());
        let block = Block::new(vec![Stmt::Switch {
            value: Expr::var("c"),
            cases: vec![case(vec![value(Literal::I32(0x8000))])],
        }]);
        insta::assert_snapshot!(body(&mut cx, block), @r"
        {
            switch (c)
            {
                case (System::Char)(32768):
                {
                    break;
                }
            }
        }
        ");
    }

    proptest! {
        #[test]
        fn prop_string_labels_never_collide_with_null(s in ".{0,24}") {
            let mut cx = cx();
            cx.declare_local("s", TypeRef::string());
            let block = Block::new(vec![Stmt::Switch {
                value: Expr::var("s"),
                cases: vec![case(vec![value(Literal::String(s.clone()))])],
            }]);
            let text = body(&mut cx, block);
            let expected = format!("case {}:", switch_hash(&s));
            prop_assert!(text.contains(&expected));
            prop_assert!(!text.contains("case 0:"));
        }
    }
}
