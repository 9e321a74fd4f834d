//! End-to-end generation from Python source through the built-in overlays.

use retarget_core::{
    ConfigError, GenerateError, Mode, Overlay, OverlayBuilder, RenderError, Transpiler,
};
use retarget_syntax::ReadError;

fn transpiler(target: &str) -> Transpiler {
    Transpiler::new(Overlay::builtin(target).expect("built-in overlay"))
}

fn generate(target: &str, source: &str) -> String {
    transpiler(target)
        .generate(source, "python", Mode::Standalone)
        .expect("generation failed")
}

mod scenarios {
    use super::*;

    #[test]
    fn arithmetic_precedence() {
        let source = "1 + 2 * 3";
        assert_eq!(generate("python", source), "(1 + (2 * 3))");
        assert_eq!(generate("javascript", source), "(1 + (2 * 3));");
        assert_eq!(generate("lua", source), "local _ = (1 + (2 * 3))");
    }

    #[test]
    fn list_indexing() {
        let source = "[1, 2, 3][1]";
        assert_eq!(generate("python", source), "[1, 2, 3][1]");
        assert_eq!(generate("javascript", source), "[1, 2, 3][1];");
        assert_eq!(generate("lua", source), "local _ = ({1, 2, 3})[1 + 1]");
    }

    #[test]
    fn boolean_of_comparisons() {
        let source = "1 < 2 and 2 < 3";
        assert_eq!(generate("python", source), "((1 < 2) and (2 < 3))");
        assert_eq!(generate("javascript", source), "((1 < 2) && (2 < 3));");
        assert_eq!(generate("lua", source), "local _ = ((1 < 2) and (2 < 3))");
    }

    #[test]
    fn unknown_function_passes_arguments_through() {
        let source = "mystery(1, \"a\")";
        assert_eq!(generate("python", source), "mystery(1, \"a\")");
        assert_eq!(generate("javascript", source), "mystery(1, \"a\");");
        assert_eq!(generate("lua", source), "mystery(1, \"a\")");
    }

    #[test]
    fn comparison_chain_folds_pairwise() {
        assert_eq!(generate("python", "a < b <= c"), "((a < b) and (b <= c))");
        assert_eq!(generate("lua", "a != b"), "local _ = (a ~= b)");
    }
}

mod programs {
    use super::*;

    const ACCUMULATE: &str = "\
total = 0
for i in range(3):
    total += i
print(total)
";

    const CLASS: &str = "\
class Point:
    def __init__(self, x):
        self.x = x

    def norm(self):
        return self.x * self.x

p = Point(3)
print(p.norm())
";

    #[test]
    fn python_round_trip() {
        insta::assert_snapshot!(generate("python", ACCUMULATE), @r"
        total = 0
        for i in range(3):
            total += i
        print(total)
        ");
    }

    #[test]
    fn javascript_loop_uses_range_helper() {
        insta::assert_snapshot!(generate("javascript", ACCUMULATE), @r"
        function range(start, stop, step = 1) {
            if (stop === undefined) { stop = start; start = 0; }
            const out = [];
            for (let i = start; step > 0 ? i < stop : i > stop; i += step) out.push(i);
            return out;
        }

        let total = 0;
        for (const i of range(3)) {
            total = (total + i);
        }
        console.log(total);
        ");
    }

    #[test]
    fn lua_loop() {
        let output = generate("lua", ACCUMULATE);
        assert!(output.starts_with("local function range(start, stop, step)"));
        assert!(output.ends_with(
            "local total = 0\nfor _, i in ipairs(range(3)) do\n    total = (total + i)\nend\nprint(total)"
        ));
    }

    #[test]
    fn python_elif_chain() {
        let source = "\
x = 5
if x < 0:
    sign = -1
elif x == 0:
    sign = 0
else:
    sign = 1
";
        insta::assert_snapshot!(generate("python", source), @r"
        x = 5
        if (x < 0):
            sign = (-1)
        elif (x == 0):
            sign = 0
        else:
            sign = 1
        ");
    }

    #[test]
    fn javascript_class() {
        insta::assert_snapshot!(generate("javascript", CLASS), @r"
        class Point {
            constructor(x) {
                this.x = x;
            }
            norm() {
                return (this.x * this.x);
            }
        }
        const p = new Point(3);
        console.log(p.norm());
        ");
    }

    #[test]
    fn lua_class() {
        insta::assert_snapshot!(generate("lua", CLASS), @r"
        local Point = {}
        Point.__index = Point
        function Point.new(x)
            local self = setmetatable({}, Point)
            self.x = x
            return self
        end
        function Point:norm()
            return (self.x * self.x)
        end
        local p = Point.new(3)
        print(p:norm())
        ");
    }

    #[test]
    fn python_imports_used_modules() {
        assert_eq!(
            generate("python", "y = math.sqrt(2)"),
            "import math\n\ny = math.sqrt(2)"
        );
    }

    #[test]
    fn block_assignments_are_declared_before_the_block() {
        let source = "if c:\n    y = 1\nprint(y)";
        assert_eq!(generate("python", source), "if c:\n    y = 1\nprint(y)");
        assert_eq!(
            generate("lua", source),
            "local y\nif c then\n    y = 1\nend\nprint(y)"
        );
        assert_eq!(
            generate("javascript", source),
            "let y;\nif (c) {\n    y = 1;\n}\nconsole.log(y);"
        );
    }

    #[test]
    fn lua_function_declares_block_locals_at_its_head() {
        let source = "\
def pick(c):
    while c:
        y = 1
        c = False
    return y
";
        insta::assert_snapshot!(generate("lua", source), @r"
        local function pick(c)
            local y
            while c do
                y = 1
                c = false
            end
            return y
        end
        ");
    }

    #[test]
    fn string_escapes_keep_their_value() {
        assert_eq!(generate("python", r#"s = "\x41\u00e9""#), "s = \"A\u{e9}\"");
        assert_eq!(generate("javascript", r#"s = "a\0""#), r#"const s = "a\x00";"#);
        assert_eq!(generate("lua", r#"s = "tab\there""#), r#"local s = "tab\there""#);
    }

    #[test]
    fn formatted_strings_are_rejected() {
        let err = transpiler("python")
            .generate("def f(x):\n    return f\"x={x}\"", "python", Mode::Standalone)
            .unwrap_err();
        assert!(matches!(err, GenerateError::Read(ReadError::Unsupported(_))));
    }

    #[test]
    fn unsupported_statements_are_dropped() {
        assert_eq!(generate("python", "with a:\n    pass\nx = 1"), "x = 1");
    }
}

mod runs {
    use super::*;

    #[test]
    fn standalone_runs_are_deterministic() {
        let source = "xs = [1, 2, 3]\na = xs[1:]\nb = xs[:2]\nf = lambda n: n + 1";
        let mut transpiler = transpiler("lua");
        let first = transpiler.generate(source, "python", Mode::Standalone).unwrap();
        let second = transpiler.generate(source, "python", Mode::Standalone).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn temp_vars_are_unique_and_restart() {
        let source = "xs = [1, 2, 3]\na = xs[1:]\nb = xs[:2]";
        let output = generate("lua", source);
        assert!(output.contains(
            "local a = (function() local slice_1 = {} for i = 1 + 1, #xs, 1 do slice_1[#slice_1 + 1] = (xs)[i] end return slice_1 end)()"
        ));
        assert!(output.contains("local slice_2 = {} for i = 0 + 1, 2, 1 do"));
        assert!(!output.contains("slice_3"));
    }

    #[test]
    fn chained_runs_share_scope_and_output() {
        let mut transpiler = transpiler("python");
        let first = transpiler.generate("x = 1", "python", Mode::Chained).unwrap();
        assert_eq!(first, "x = 1");

        let second = transpiler.generate("y = x * 2", "python", Mode::Chained).unwrap();
        assert_eq!(second, "x = 1\ny = (x * 2)");
        assert!(transpiler.state().lookup("x").is_some());

        transpiler.reset();
        assert!(transpiler.state().output().is_empty());
    }

    #[test]
    fn missing_template_is_fatal() {
        let source = "for i in range(3):\n    continue";
        let err = transpiler("lua")
            .generate(source, "python", Mode::Standalone)
            .unwrap_err();
        assert!(matches!(
            err,
            GenerateError::Render(RenderError::MissingTemplate { ref kind, ref template, line: 2 })
                if kind == "Continue" && template == "continue"
        ));
    }

    #[test]
    fn chained_javascript_declarations_stay_reassignable() {
        let mut transpiler = transpiler("javascript");
        transpiler.generate("x = 1", "python", Mode::Chained).unwrap();
        let output = transpiler.generate("x = 2", "python", Mode::Chained).unwrap();
        assert_eq!(output, "let x = 1;\nx = 2;");
    }

    #[test]
    fn failed_chained_run_leaves_no_trace() {
        let mut transpiler = transpiler("lua");
        let source = "i = 0\nwhile i:\n    continue";
        assert!(transpiler.generate(source, "python", Mode::Chained).is_err());

        let output = transpiler.generate("i = 5", "python", Mode::Chained).unwrap();
        assert_eq!(output, "local i = 5");
    }

    #[test]
    fn missing_bound_len_reports_a_call() {
        let overlay = OverlayBuilder::for_target("python")
            .and_then(|builder| builder.merge_str("templates: {call: null}"))
            .and_then(OverlayBuilder::build)
            .expect("overlay builds");
        let err = Transpiler::new(overlay)
            .generate("xs = [1, 2]\nys = xs[1:]", "python", Mode::Standalone)
            .unwrap_err();
        assert!(matches!(
            err,
            GenerateError::Render(RenderError::MissingTemplate { ref kind, line: 2, .. })
                if kind == "Call"
        ));
    }

    #[test]
    fn unknown_dialect() {
        let err = transpiler("python")
            .generate("x", "cobol", Mode::Standalone)
            .unwrap_err();
        assert!(matches!(err, GenerateError::UnknownDialect(ref d) if d == "cobol"));
    }
}

mod overlays {
    use super::*;

    fn with_overlay(target: &str, documents: &[&str]) -> Transpiler {
        let overlay = documents
            .iter()
            .try_fold(
                OverlayBuilder::for_target(target).expect("built-in overlay"),
                |builder, yaml| builder.merge_str(yaml),
            )
            .and_then(OverlayBuilder::build)
            .expect("overlay builds");
        Transpiler::new(overlay)
    }

    #[test]
    fn left_chain_varies_slowest() {
        let rules = r#"
"str.+.any": {template: "concat({{left}}, {{right}})"}
"any.+.unknown": {template: "lhs_any({{left}}, {{right}})"}
"#;
        let mut transpiler = with_overlay("python", &[rules]);
        let output = transpiler.generate("\"a\" + x", "python", Mode::Standalone).unwrap();
        assert_eq!(output, "concat(\"a\", x)");

        let mut transpiler = with_overlay("python", &[rules, "\"str.+.any\": null"]);
        let output = transpiler.generate("\"a\" + x", "python", Mode::Standalone).unwrap();
        assert_eq!(output, "lhs_any(\"a\", x)");
    }

    #[test]
    fn user_rules_merge_field_by_field() {
        let mut transpiler = with_overlay("javascript", &["print: {alt_name: log}"]);
        let output = transpiler.generate("print(len(\"ab\"))", "python", Mode::Standalone).unwrap();
        assert_eq!(output, "log(\"ab\".length);");
    }

    #[test]
    fn locals_shadow_function_rules() {
        let source = "def print(v):\n    return v\nprint(1)";
        let output = generate("javascript", source);
        assert!(output.ends_with("print(1);"), "{}", output);
    }

    #[test]
    fn module_members_fall_back_to_generic_rules() {
        let mut transpiler = with_overlay("python", &["any.frob: {alt_name: FROB}"]);
        let output = transpiler
            .generate("math.frob(1)\n\"a\".frob(1)", "python", Mode::Standalone)
            .unwrap();
        assert_eq!(output, "import math\n\nmath.FROB(1)\n\"a\".FROB(1)");

        let output = transpiler.generate("math.sqrt(2)", "python", Mode::Standalone).unwrap();
        assert_eq!(output, "import math\n\nmath.sqrt(2)");
    }

    #[test]
    fn bad_rules_fail_at_load() {
        let err = OverlayBuilder::for_target("python")
            .and_then(|builder| builder.merge_str("len: {type: \"list[\"}"))
            .and_then(OverlayBuilder::build)
            .unwrap_err();
        assert!(matches!(err, ConfigError::TypeExpr { ref key, .. } if key == "len"));
    }
}
