//! Full Pipeline Integration Tests
//!
//! Source -> module -> bytes -> decoded module -> VM. Control-flow checks
//! observe which blocks ran through the program's output.

use integration_tests::{run_source, Execution};

fn output(source: &str) -> String {
    run_source(source, &[]).unwrap().output
}

fn output_with_input(source: &str, input: &[i64]) -> String {
    run_source(source, input).unwrap().output
}

// =============================================================================
// If / else
// =============================================================================

#[test]
fn test_if_true_runs_only_then_block() {
    let source = "fn main() -> void {
        if 1 == 1 { putchar('A'); } else { putchar('B'); }
        putchar('.');
    }";
    assert_eq!(output(source), "A.");
}

#[test]
fn test_if_false_runs_only_else_block() {
    let source = "fn main() -> void {
        if 1 == 2 { putchar('A'); } else { putchar('B'); }
        putchar('.');
    }";
    assert_eq!(output(source), "B.");
}

#[test]
fn test_if_without_else() {
    let template = "fn main() -> void { if COND { putchar('A'); } putchar('.'); }";
    assert_eq!(output(&template.replace("COND", "3 > 2")), "A.");
    assert_eq!(output(&template.replace("COND", "3 < 2")), ".");
}

#[test]
fn test_every_comparison_operator() {
    let cases = [
        ("1 == 1", true),
        ("1 == 2", false),
        ("1 != 2", true),
        ("2 != 2", false),
        ("-1 < 2", true),
        ("2 < 2", false),
        ("3 > 2", true),
        ("2 > 2", false),
        ("2 <= 2", true),
        ("3 <= 2", false),
        ("2 >= 2", true),
        ("-5 >= 2", false),
    ];
    for (cond, expected) in cases {
        let source = format!(
            "fn main() -> void {{ if {} {{ putchar('T'); }} else {{ putchar('F'); }} }}",
            cond
        );
        let wanted = if expected { "T" } else { "F" };
        assert_eq!(output(&source), wanted, "condition {}", cond);
    }
}

#[test]
fn test_plain_value_conditions() {
    let template = "fn main() -> void { let v: int = VALUE; if v { putchar('T'); } else { putchar('F'); } }";
    assert_eq!(output(&template.replace("VALUE", "7")), "T");
    assert_eq!(output(&template.replace("VALUE", "0")), "F");
    assert_eq!(output(&template.replace("VALUE", "-1")), "T");
}

#[test]
fn test_else_if_chain() {
    let source = "
        fn classify(n: int) -> int {
            if n < 0 { return 0; } else if n == 0 { return 1; } else { return 2; }
        }
        fn main() -> void {
            putint(classify(-5));
            putint(classify(0));
            putint(classify(7));
        }
    ";
    assert_eq!(output(source), "012");
}

#[test]
fn test_nested_if() {
    let source = "
        fn pick(a: int, b: int) -> void {
            if a > 0 {
                if b > 0 { putchar('1'); } else { putchar('2'); }
            } else {
                if b > 0 { putchar('3'); } else { putchar('4'); }
            }
        }
        fn main() -> void { pick(1, 1); pick(1, 0); pick(0, 1); pick(0, 0); }
    ";
    assert_eq!(output(source), "1234");
}

// =============================================================================
// While
// =============================================================================

fn loop_body_runs(limit: i64) -> usize {
    let source = format!(
        "fn main() -> void {{
            let i: int = 0;
            while i < {} {{ putchar('x'); i = i + 1; }}
        }}",
        limit
    );
    output(&source).len()
}

#[test]
fn test_while_false_runs_zero_times() {
    assert_eq!(loop_body_runs(0), 0);
}

#[test]
fn test_while_runs_exactly_k_times() {
    for k in [1, 2, 5, 17] {
        assert_eq!(loop_body_runs(k), k as usize);
    }
}

#[test]
fn test_while_counts_down_from_input() {
    let source = "fn main() -> void {
        let n: int = getint();
        while n != 0 { putint(n); n = n - 1; }
        putln();
    }";
    assert_eq!(output_with_input(source, &[3]), "321\n");
    assert_eq!(output_with_input(source, &[0]), "\n");
}

#[test]
fn test_nested_while() {
    let source = "fn main() -> int {
        let i: int = 0;
        let total: int = 0;
        while i < 3 {
            let j: int = 0;
            while j < 4 { total = total + 1; j = j + 1; }
            i = i + 1;
        }
        return total;
    }";
    assert_eq!(run_source(source, &[]).unwrap().result, Some(12));
}

#[test]
fn test_while_with_if_inside() {
    let source = "fn main() -> void {
        let i: int = 0;
        while i < 6 {
            if i / 2 * 2 == i { putchar('e'); } else { putchar('o'); }
            i = i + 1;
        }
    }";
    assert_eq!(output(source), "eoeoeo");
}

#[test]
fn test_return_from_inside_loop() {
    let source = "
        fn first_square_above(limit: int) -> int {
            let n: int = 0;
            while 1 {
                if n * n > limit { return n; }
                n = n + 1;
            }
            return -1;
        }
        fn main() -> int { return first_square_above(50); }
    ";
    assert_eq!(run_source(source, &[]).unwrap().result, Some(8));
}

// =============================================================================
// Programs
// =============================================================================

#[test]
fn test_global_initialisers_run_before_main() {
    let source = "
        let base: int = 40;
        const step: int = 2;
        fn main() -> int { return base + step; }
    ";
    assert_eq!(
        run_source(source, &[]).unwrap(),
        Execution {
            result: Some(42),
            output: String::new()
        }
    );
}

#[test]
fn test_string_output() {
    let source = "
        let greeting: int = \"hello\";
        fn main() -> void { putstr(greeting); putchar(' '); putstr(\"world\"); putln(); }
    ";
    assert_eq!(output(source), "hello world\n");
}

#[test]
fn test_arithmetic_precedence() {
    let source = "fn main() -> int { return 2 + 3 * 4 - (10 - 4) / 3 + -1; }";
    assert_eq!(run_source(source, &[]).unwrap().result, Some(11));
}

#[test]
fn test_recursive_sum_of_inputs() {
    let source = "
        fn sum(n: int) -> int {
            if n == 0 { return 0; }
            return getint() + sum(n - 1);
        }
        fn main() -> void { putint(sum(getint())); }
    ";
    assert_eq!(output_with_input(source, &[4, 10, 20, 30, 40]), "100");
}

#[test]
fn test_comments_are_ignored() {
    let source = "
        // entry point
        fn main() -> int { // returns a constant
            return 5; // five
        }
    ";
    assert_eq!(run_source(source, &[]).unwrap().result, Some(5));
}
