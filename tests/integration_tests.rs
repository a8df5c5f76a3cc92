use std::cell::{Cell, RefCell};
use std::rc::Rc;
use trtl::config::RuntimeConfig;
use trtl::console::PrintSink;
use trtl::interpreter::exec::{Clock, InterruptHandle};
use trtl::interpreter::value::Value;
use trtl::keywords::load_keywords;
use trtl::runtime::{RunError, Runtime, Stage};

// ==================== TEST HOST ====================

/// Captures everything `print` emits so tests can assert on output order.
#[derive(Default)]
struct RecordingSink {
    lines: RefCell<Vec<String>>,
}

impl PrintSink for RecordingSink {
    fn print(&self, text: &str) {
        self.lines.borrow_mut().push(text.to_string());
    }
}

/// Counts driver ticks instead of sleeping; can fire an interrupt once a
/// given tick count is reached, standing in for a user hitting Run again
/// mid-animation.
#[derive(Default)]
struct TestClock {
    ticks: Cell<usize>,
    interrupt_after: Cell<Option<usize>>,
    handle: RefCell<Option<InterruptHandle>>,
}

impl Clock for TestClock {
    fn tick(&self) {
        self.ticks.set(self.ticks.get() + 1);
        if let Some(limit) = self.interrupt_after.get() {
            if self.ticks.get() >= limit {
                if let Some(handle) = &*self.handle.borrow() {
                    handle.interrupt();
                }
            }
        }
    }
}

struct Host {
    runtime: Runtime,
    sink: Rc<RecordingSink>,
    clock: Rc<TestClock>,
}

fn host_with_speed(speed: f64) -> Host {
    let keywords = load_keywords(None).expect("default keywords");
    let sink = Rc::new(RecordingSink::default());
    let clock = Rc::new(TestClock::default());
    let runtime = Runtime::new(
        RuntimeConfig {
            speed,
            ..Default::default()
        },
        keywords,
        Rc::clone(&sink) as Rc<dyn PrintSink>,
        Rc::clone(&clock) as Rc<dyn Clock>,
    );
    clock.handle.replace(Some(runtime.interrupt_handle()));
    Host {
        runtime,
        sink,
        clock,
    }
}

// Instant animation by default; most tests don't care about ticks.
fn host() -> Host {
    host_with_speed(-1.0)
}

fn eval(source: &str) -> Result<Value, RunError> {
    host().runtime.run(source)
}

// ==================== OPERATORS & PRECEDENCE ====================

#[test]
fn test_binary_precedence() {
    // Multiplication binds tighter than addition: 2 + (3 * 4)
    let result = eval("2 + 3 * 4\n");
    match result {
        Ok(Value::Num(n)) => assert_eq!(n, 14.0),
        _ => panic!("Expected 14, got {:?}", result),
    }
}

#[test]
fn test_grouping_overrides_precedence() {
    let result = eval("(2 + 3) * 4\n");
    match result {
        Ok(Value::Num(n)) => assert_eq!(n, 20.0),
        _ => panic!("Expected 20, got {:?}", result),
    }
}

#[test]
fn test_subtraction_left_associative() {
    // (10 - 5) - 2, not 10 - (5 - 2)
    let result = eval("10 - 5 - 2\n");
    match result {
        Ok(Value::Num(n)) => assert_eq!(n, 3.0),
        _ => panic!("Expected 3, got {:?}", result),
    }
}

#[test]
fn test_modulo() {
    let result = eval("10 % 3\n");
    match result {
        Ok(Value::Num(n)) => assert_eq!(n, 1.0),
        _ => panic!("Expected 1, got {:?}", result),
    }
}

#[test]
fn test_division_by_zero_is_infinite() {
    // IEEE float semantics, no guard
    let result = eval("1 / 0\n");
    match result {
        Ok(Value::Num(n)) => assert!(n.is_infinite() && n > 0.0),
        _ => panic!("Expected +inf, got {:?}", result),
    }
}

#[test]
fn test_negative_literal() {
    // '-' directly before a digit starts a negative literal
    let result = eval("-5 + 3\n");
    match result {
        Ok(Value::Num(n)) => assert_eq!(n, -2.0),
        _ => panic!("Expected -2, got {:?}", result),
    }
}

#[test]
fn test_minus_before_digit_binds_to_literal() {
    // "x -2" lexes as [x][-2], which is not a subtraction; the parser then
    // rejects the dangling literal. Subtraction needs "x - 2".
    let result = eval("x = 5\ny = x -2\n");
    assert!(result.is_err(), "Expected parse error, got {:?}", result);

    let result = eval("x = 5\n(x - 2)\n");
    match result {
        Ok(Value::Num(n)) => assert_eq!(n, 3.0),
        _ => panic!("Expected 3, got {:?}", result),
    }
}

#[test]
fn test_string_concatenation() {
    let result = eval("'foo' + \"bar\"\n");
    match result {
        Ok(Value::Str(s)) => assert_eq!(s.as_ref(), "foobar"),
        _ => panic!("Expected 'foobar', got {:?}", result),
    }
}

#[test]
fn test_number_plus_string_concatenates() {
    // '+' with at least one string operand concatenates
    let result = eval("'n: ' + 4\n");
    match result {
        Ok(Value::Str(s)) => assert_eq!(s.as_ref(), "n: 4"),
        _ => panic!("Expected 'n: 4', got {:?}", result),
    }
}

#[test]
fn test_string_minus_is_unsupported() {
    let result = eval("'a' - 'b'\n");
    match result {
        Err(e) => {
            assert_eq!(e.stage, Stage::Runtime);
            assert!(e.message.contains("not supported"), "got: {}", e.message);
        }
        _ => panic!("Expected unsupported-operator error, got {:?}", result),
    }
}

#[test]
fn test_bool_plus_number_is_unsupported() {
    let result = eval("true + 1\n");
    assert!(result.is_err(), "Expected error, got {:?}", result);
}

// ==================== COMPARISONS & LOGIC ====================

#[test]
fn test_numeric_comparison() {
    match eval("1 < 2\n") {
        Ok(Value::Bool(b)) => assert!(b),
        other => panic!("Expected true, got {:?}", other),
    }
    match eval("2 <= 2\n") {
        Ok(Value::Bool(b)) => assert!(b),
        other => panic!("Expected true, got {:?}", other),
    }
    match eval("1 >= 2\n") {
        Ok(Value::Bool(b)) => assert!(!b),
        other => panic!("Expected false, got {:?}", other),
    }
}

#[test]
fn test_string_comparison() {
    match eval("'apple' < 'banana'\n") {
        Ok(Value::Bool(b)) => assert!(b),
        other => panic!("Expected true, got {:?}", other),
    }
}

#[test]
fn test_ordering_across_types_is_unsupported() {
    let result = eval("1 < 'a'\n");
    assert!(result.is_err(), "Expected error, got {:?}", result);
}

#[test]
fn test_equality_across_types_is_false() {
    match eval("1 == 'a'\n") {
        Ok(Value::Bool(b)) => assert!(!b),
        other => panic!("Expected false, got {:?}", other),
    }
    match eval("1 != 'a'\n") {
        Ok(Value::Bool(b)) => assert!(b),
        other => panic!("Expected true, got {:?}", other),
    }
}

#[test]
fn test_logical_connectives() {
    match eval("1 < 2 & 2 < 3\n") {
        Ok(Value::Bool(b)) => assert!(b),
        other => panic!("Expected true, got {:?}", other),
    }
    match eval("1 > 2 | 2 > 1\n") {
        Ok(Value::Bool(b)) => assert!(b),
        other => panic!("Expected true, got {:?}", other),
    }
}

#[test]
fn test_logical_connectives_demand_bools() {
    let result = eval("true & 1\n");
    assert!(result.is_err(), "Expected error, got {:?}", result);
}

#[test]
fn test_no_short_circuit() {
    // '&' evaluates both sides even when the left is already false
    let mut host = host();
    let result = host.runtime.run(
        "fn side() do\nprint 'hit'\ntrue\nend\nfalse & [side]\n",
    );
    match result {
        Ok(Value::Bool(b)) => assert!(!b),
        other => panic!("Expected false, got {:?}", other),
    }
    assert_eq!(host.sink.lines.borrow().as_slice(), ["hit (string)"]);
}

// ==================== VARIABLES & SCOPE ====================

#[test]
fn test_assignment_then_reassignment() {
    // '=' declares on first sight and reassigns afterwards; no
    // duplicate-declaration error for the second write
    let result = eval("x = 1\nx = x + 1\n(x)\n");
    match result {
        Ok(Value::Num(n)) => assert_eq!(n, 2.0),
        _ => panic!("Expected 2, got {:?}", result),
    }
}

#[test]
fn test_undefined_variable() {
    let result = eval("(nope)\n");
    match result {
        Err(e) => {
            assert_eq!(e.stage, Stage::Runtime);
            assert!(e.message.contains("nope"), "got: {}", e.message);
        }
        _ => panic!("Expected undefined-variable error, got {:?}", result),
    }
}

#[test]
fn test_bare_identifier_is_a_call() {
    // A lone identifier at statement position is a zero-argument call,
    // not a variable read; '(x)' is the expression form.
    let result = eval("x = 1\nx\n");
    match result {
        Err(e) => assert!(e.message.contains("'x'"), "got: {}", e.message),
        _ => panic!("Expected undefined-function error, got {:?}", result),
    }
}

// ==================== CONTROL FLOW ====================

#[test]
fn test_if_true_runs_body() {
    let result = eval("if 1 < 2 do\nx = 1\nend\n(x)\n");
    match result {
        Ok(Value::Num(n)) => assert_eq!(n, 1.0),
        _ => panic!("Expected 1, got {:?}", result),
    }
}

#[test]
fn test_if_false_leaves_binding_unset() {
    let result = eval("if 2 < 1 do\nx = 1\nend\n(x)\n");
    match result {
        Err(e) => assert!(e.message.contains("'x'"), "got: {}", e.message),
        _ => panic!("Expected undefined-variable error, got {:?}", result),
    }
}

#[test]
fn test_if_else() {
    let result = eval("if 2 < 1 do\ny = 'then'\nend\nelse do\ny = 'else'\nend\n(y)\n");
    match result {
        Ok(Value::Str(s)) => assert_eq!(s.as_ref(), "else"),
        _ => panic!("Expected 'else', got {:?}", result),
    }
}

#[test]
fn test_else_if_chain() {
    let code = "x = 2\n\
                if x == 1 do\ny = 'one'\nend\n\
                else if x == 2 do\ny = 'two'\nend\n\
                else do\ny = 'many'\nend\n\
                (y)\n";
    let result = eval(code);
    match result {
        Ok(Value::Str(s)) => assert_eq!(s.as_ref(), "two"),
        _ => panic!("Expected 'two', got {:?}", result),
    }
}

#[test]
fn test_non_bool_condition_rejected() {
    let result = eval("if 1 do\nx = 1\nend\n");
    match result {
        Err(e) => assert!(e.message.contains("boolean"), "got: {}", e.message),
        _ => panic!("Expected type-mismatch error, got {:?}", result),
    }
}

#[test]
fn test_loop_is_while_style() {
    let code = "i = 0\nsum = 0\n\
                loop i < 5 do\ni = i + 1\nsum = sum + i\nend\n\
                (sum)\n";
    let result = eval(code);
    match result {
        Ok(Value::Num(n)) => assert_eq!(n, 15.0),
        _ => panic!("Expected 15, got {:?}", result),
    }
}

#[test]
fn test_loop_condition_false_skips_body() {
    let result = eval("loop 1 > 2 do\nx = 1\nend\n(2)\n");
    match result {
        Ok(Value::Num(n)) => assert_eq!(n, 2.0),
        _ => panic!("Expected 2, got {:?}", result),
    }
}

#[test]
fn test_for_leaves_final_count() {
    let result = eval("for i 3 do\nout = i\nend\n(out)\n");
    match result {
        Ok(Value::Num(n)) => assert_eq!(n, 3.0),
        _ => panic!("Expected 3, got {:?}", result),
    }
}

#[test]
fn test_for_body_observes_one_through_n() {
    // The body must see 1, 2, 3 in order — never 0, 1, 2
    let mut host = host();
    host.runtime
        .run("for i 3 do\nprint i\nend\n")
        .expect("loop runs");
    assert_eq!(
        host.sink.lines.borrow().as_slice(),
        ["1 (number)", "2 (number)", "3 (number)"]
    );
}

#[test]
fn test_for_variable_is_global() {
    // The loop variable is bound in the global scope and survives the loop
    let result = eval("for i 3 do\nout = i\nend\n(i)\n");
    match result {
        Ok(Value::Num(n)) => assert_eq!(n, 3.0),
        _ => panic!("Expected 3, got {:?}", result),
    }
}

#[test]
fn test_for_zero_iterations() {
    let result = eval("for i 0 do\nout = 1\nend\n(i)\n");
    match result {
        Ok(Value::Num(n)) => assert_eq!(n, 0.0),
        _ => panic!("Expected 0, got {:?}", result),
    }
}

#[test]
fn test_for_amount_must_be_number() {
    let result = eval("for i 'three' do\nout = 1\nend\n");
    assert!(result.is_err(), "Expected error, got {:?}", result);
}

// ==================== FUNCTIONS ====================

#[test]
fn test_function_call_returns_last_value() {
    let code = "fn add(a, b) do\na + b\nend\nx = [add 1, 2]\n(x)\n";
    let result = eval(code);
    match result {
        Ok(Value::Num(n)) => assert_eq!(n, 3.0),
        _ => panic!("Expected 3, got {:?}", result),
    }
}

#[test]
fn test_bare_call_statement() {
    // The newline-terminated call form, no brackets
    let mut host = host();
    host.runtime
        .run("fn greet(name) do\nprint 'hi ' + name\nend\ngreet 'sam'\n")
        .expect("call runs");
    assert_eq!(host.sink.lines.borrow().as_slice(), ["hi sam (string)"]);
}

#[test]
fn test_zero_argument_bracket_call() {
    let result = eval("fn answer() do\n42\nend\nx = [answer]\n(x)\n");
    match result {
        Ok(Value::Num(n)) => assert_eq!(n, 42.0),
        _ => panic!("Expected 42, got {:?}", result),
    }
}

#[test]
fn test_arity_mismatch_halts_execution() {
    let mut host = host();
    let result = host
        .runtime
        .run("fn add(a, b) do\na + b\nend\nadd 1\nprint 'after'\n");
    match result {
        Err(e) => {
            assert_eq!(e.stage, Stage::Runtime);
            assert!(
                e.message.contains("expected 2 arguments but got 1"),
                "got: {}",
                e.message
            );
        }
        _ => panic!("Expected arity error, got {:?}", result),
    }
    // the statement after the failing call never ran
    assert!(host.sink.lines.borrow().is_empty());
}

#[test]
fn test_calls_get_fresh_frames() {
    // Same-named parameters in nested calls must not collide: with the old
    // collapse-to-global binding this would be 9, not 7.
    let code = "fn double(x) do\nx * 2\nend\n\
                fn addone(x) do\n[double 3] + x\nend\n\
                y = [addone 1]\n(y)\n";
    let result = eval(code);
    match result {
        Ok(Value::Num(n)) => assert_eq!(n, 7.0),
        _ => panic!("Expected 7, got {:?}", result),
    }
}

#[test]
fn test_recursion() {
    let code = "fn fact(n) do\n\
                if n < 2 do\n1\nend\n\
                else do\n[fact n - 1] * n\nend\n\
                end\n\
                y = [fact 5]\n(y)\n";
    let result = eval(code);
    match result {
        Ok(Value::Num(n)) => assert_eq!(n, 120.0),
        _ => panic!("Expected 120, got {:?}", result),
    }
}

#[test]
fn test_function_redefinition_last_wins() {
    let code = "fn f() do\n1\nend\nfn f() do\n2\nend\nx = [f]\n(x)\n";
    let result = eval(code);
    match result {
        Ok(Value::Num(n)) => assert_eq!(n, 2.0),
        _ => panic!("Expected 2, got {:?}", result),
    }
}

#[test]
fn test_user_function_can_shadow_builtin() {
    // one global table, last write wins — even over builtins
    let result = eval("fn forward(n) do\nn\nend\nx = [forward 5]\n(x)\n");
    match result {
        Ok(Value::Num(n)) => assert_eq!(n, 5.0),
        _ => panic!("Expected 5, got {:?}", result),
    }
}

#[test]
fn test_undefined_function() {
    let result = eval("nosuch 1\n");
    match result {
        Err(e) => {
            assert_eq!(e.stage, Stage::Runtime);
            assert!(e.message.contains("nosuch"), "got: {}", e.message);
        }
        _ => panic!("Expected undefined-function error, got {:?}", result),
    }
}

#[test]
fn test_duplicate_parameter_names_rejected() {
    let result = eval("fn bad(a, a) do\na\nend\n[bad 1, 2]\n");
    match result {
        Err(e) => assert!(e.message.contains("already defined"), "got: {}", e.message),
        _ => panic!("Expected duplicate-declaration error, got {:?}", result),
    }
}

// ==================== LEXER FAILURES ====================

#[test]
fn test_unterminated_string_is_a_lex_error() {
    // must fail in the lexer; the parser is never reached
    let result = eval("print \"oops\n");
    match result {
        Err(e) => {
            assert_eq!(e.stage, Stage::Lexer);
            assert!(
                e.message.contains("unterminated string"),
                "got: {}",
                e.message
            );
        }
        _ => panic!("Expected lex error, got {:?}", result),
    }
}

#[test]
fn test_unrecognized_character() {
    let result = eval("@\n");
    match result {
        Err(e) => {
            assert_eq!(e.stage, Stage::Lexer);
            assert!(
                e.message.contains("unrecognized character"),
                "got: {}",
                e.message
            );
        }
        _ => panic!("Expected lex error, got {:?}", result),
    }
}

#[test]
fn test_float_with_no_fraction_digits() {
    let result = eval("x = 3.\n");
    match result {
        Err(e) => {
            assert_eq!(e.stage, Stage::Lexer);
            assert!(e.message.contains("invalid float"), "got: {}", e.message);
        }
        _ => panic!("Expected lex error, got {:?}", result),
    }
}

#[test]
fn test_fractional_literal() {
    let result = eval("1.5 + 2.25\n");
    match result {
        Ok(Value::Num(n)) => assert_eq!(n, 3.75),
        _ => panic!("Expected 3.75, got {:?}", result),
    }
}

#[test]
fn test_bare_bang_rejected() {
    let result = eval("x = 1 ! 2\n");
    match result {
        Err(e) => assert_eq!(e.stage, Stage::Lexer),
        _ => panic!("Expected lex error, got {:?}", result),
    }
}

// ==================== PARSER FAILURES ====================

#[test]
fn test_missing_end() {
    let result = eval("if true do\nx = 1\n");
    match result {
        Err(e) => {
            assert_eq!(e.stage, Stage::Parser);
            assert!(e.message.contains("'end'"), "got: {}", e.message);
        }
        _ => panic!("Expected parse error, got {:?}", result),
    }
}

#[test]
fn test_missing_do() {
    let result = eval("if true\nx = 1\nend\n");
    match result {
        Err(e) => {
            assert_eq!(e.stage, Stage::Parser);
            assert!(e.message.contains("'do'"), "got: {}", e.message);
        }
        _ => panic!("Expected parse error, got {:?}", result),
    }
}

#[test]
fn test_assignment_needs_an_expression() {
    let result = eval("x =\n");
    match result {
        Err(e) => assert_eq!(e.stage, Stage::Parser),
        _ => panic!("Expected parse error, got {:?}", result),
    }
}

#[test]
fn test_unclosed_paren() {
    let result = eval("(1 + 2\n");
    match result {
        Err(e) => assert_eq!(e.stage, Stage::Parser),
        _ => panic!("Expected parse error, got {:?}", result),
    }
}

// ==================== SOURCE TEXTURE ====================

#[test]
fn test_comments_and_blank_lines() {
    let code = "# leading comment\n\n\nx = 1 # trailing comment\n\n(x)\n";
    let result = eval(code);
    match result {
        Ok(Value::Num(n)) => assert_eq!(n, 1.0),
        _ => panic!("Expected 1, got {:?}", result),
    }
}

#[test]
fn test_statement_at_eof_without_newline() {
    let result = eval("x = 1\n(x)");
    match result {
        Ok(Value::Num(n)) => assert_eq!(n, 1.0),
        _ => panic!("Expected 1, got {:?}", result),
    }
}

#[test]
fn test_empty_program_is_null() {
    match eval("") {
        Ok(Value::Null) => {}
        other => panic!("Expected Null, got {:?}", other),
    }
    match eval("# nothing but a comment\n") {
        Ok(Value::Null) => {}
        other => panic!("Expected Null, got {:?}", other),
    }
}

// ==================== BUILTINS: CONSOLE & MATH ====================

#[test]
fn test_print_formats_value_and_type() {
    let mut host = host();
    host.runtime
        .run("print 3\nprint 'hi'\nprint true\n")
        .expect("prints run");
    assert_eq!(
        host.sink.lines.borrow().as_slice(),
        ["3 (number)", "hi (string)", "true (boolean)"]
    );
}

#[test]
fn test_join() {
    let result = eval("x = [join 'a', 'b']\n(x)\n");
    match result {
        Ok(Value::Str(s)) => assert_eq!(s.as_ref(), "ab"),
        _ => panic!("Expected 'ab', got {:?}", result),
    }
}

#[test]
fn test_math_builtins() {
    match eval("x = [sqrt 16]\n(x)\n") {
        Ok(Value::Num(n)) => assert_eq!(n, 4.0),
        other => panic!("Expected 4, got {:?}", other),
    }
    match eval("x = [pow 2, 10]\n(x)\n") {
        Ok(Value::Num(n)) => assert_eq!(n, 1024.0),
        other => panic!("Expected 1024, got {:?}", other),
    }
    match eval("x = [min 3, 1]\n(x)\n") {
        Ok(Value::Num(n)) => assert_eq!(n, 1.0),
        other => panic!("Expected 1, got {:?}", other),
    }
    match eval("x = [pi]\n(x)\n") {
        Ok(Value::Num(n)) => assert!((n - std::f64::consts::PI).abs() < 1e-12),
        other => panic!("Expected pi, got {:?}", other),
    }
}

#[test]
fn test_builtin_argument_type_error() {
    let result = eval("forward 'far'\n");
    match result {
        Err(e) => {
            assert_eq!(e.stage, Stage::Runtime);
            assert!(e.message.contains("expects a number"), "got: {}", e.message);
        }
        _ => panic!("Expected builtin error, got {:?}", result),
    }
}

// ==================== TURTLE ====================

#[test]
fn test_instant_forward_moves_up() {
    let mut host = host();
    host.runtime.run("forward 100\n").expect("forward runs");

    let turtle = host.runtime.turtle();
    let (x, y) = turtle.borrow().position();
    // canvas is 800x600, start is the center, heading up
    assert!((x - 400.0).abs() < 1e-9);
    assert!((y - 200.0).abs() < 1e-9);
    assert_eq!(turtle.borrow().segments().len(), 1);
    assert_eq!(host.clock.ticks.get(), 0, "instant moves never tick");
}

#[test]
fn test_animated_forward_steps_and_ticks() {
    let mut host = host_with_speed(10.0);
    host.runtime.run("forward 100\n").expect("forward runs");

    let turtle = host.runtime.turtle();
    let (x, y) = turtle.borrow().position();
    assert!((x - 400.0).abs() < 1e-9);
    assert!((y - 200.0).abs() < 1e-9);
    // 100 units at 10 per tick: 10 slices, with a tick between each
    assert_eq!(turtle.borrow().segments().len(), 10);
    assert_eq!(host.clock.ticks.get(), 9);
}

#[test]
fn test_penup_moves_without_drawing() {
    let mut host = host();
    host.runtime
        .run("penup\nforward 50\n")
        .expect("move runs");

    let turtle = host.runtime.turtle();
    assert!(turtle.borrow().segments().is_empty());
    let (_, y) = turtle.borrow().position();
    assert!((y - 250.0).abs() < 1e-9);
}

#[test]
fn test_right_turn_then_forward() {
    let mut host = host();
    host.runtime
        .run("right 90\nforward 100\n")
        .expect("turtle runs");

    let turtle = host.runtime.turtle();
    let (x, y) = turtle.borrow().position();
    // up + 90° clockwise = east
    assert!((x - 500.0).abs() < 1e-6);
    assert!((y - 300.0).abs() < 1e-6);
    assert!((turtle.borrow().heading() - 0.0).abs() < 1e-6);
}

#[test]
fn test_goto_is_center_relative() {
    let mut host = host();
    host.runtime.run("goto 10, 20\n").expect("goto runs");

    let turtle = host.runtime.turtle();
    let (x, y) = turtle.borrow().position();
    assert!((x - 410.0).abs() < 1e-9);
    assert!((y - 280.0).abs() < 1e-9); // y grows upward in goto coordinates
}

#[test]
fn test_circle_closes_on_itself() {
    let mut host = host();
    host.runtime.run("circle 50\n").expect("circle runs");

    let turtle = host.runtime.turtle();
    let (x, y) = turtle.borrow().position();
    assert!(turtle.borrow().segments().len() >= 4);
    assert!((x - 400.0).abs() < 1e-6, "circle should close, x = {}", x);
    assert!((y - 300.0).abs() < 1e-6, "circle should close, y = {}", y);
}

#[test]
fn test_loop_draws_square() {
    let mut host = host();
    host.runtime
        .run("for i 4 do\nforward 100\nright 90\nend\n")
        .expect("square runs");

    let turtle = host.runtime.turtle();
    assert_eq!(turtle.borrow().segments().len(), 4);
    let (x, y) = turtle.borrow().position();
    assert!((x - 400.0).abs() < 1e-6);
    assert!((y - 300.0).abs() < 1e-6);
}

#[test]
fn test_fill_dot_and_write_record_marks() {
    let mut host = host();
    host.runtime
        .run("begin_fill\nfor i 3 do\nforward 100\nright 120\nend\nend_fill\ndot\nwrite 'hi'\n")
        .expect("marks run");

    let turtle = host.runtime.turtle();
    let turtle = turtle.borrow();
    let marks = turtle.marks();
    assert_eq!(marks.len(), 3);
    match &marks[0] {
        trtl::turtle::Mark::Fill { points, .. } => {
            // the start point plus one per side of the triangle
            assert_eq!(points.len(), 4);
        }
        other => panic!("Expected a fill mark, got {:?}", other),
    }
    assert!(matches!(marks[1], trtl::turtle::Mark::Dot { .. }));
    match &marks[2] {
        trtl::turtle::Mark::Text { text, .. } => assert_eq!(text, "hi"),
        other => panic!("Expected a text mark, got {:?}", other),
    }
}

// ==================== TIMERS, SUSPENSION & INTERRUPTION ====================

#[test]
fn test_wait_consumes_ticks() {
    let mut host = host();
    host.runtime
        .run("wait 5\nprint 'done'\n")
        .expect("wait runs");
    assert_eq!(host.clock.ticks.get(), 5);
    assert_eq!(host.sink.lines.borrow().as_slice(), ["done (string)"]);
}

#[test]
fn test_interrupt_abandons_suspended_move() {
    // Interrupt fires three ticks into a 100-step move: the move must stop
    // short and nothing after it may run.
    let mut host = host_with_speed(1.0);
    host.clock.interrupt_after.set(Some(3));

    let result = host.runtime.run("forward 100\nprint 'done'\n");
    assert!(result.is_ok(), "interruption is not an error: {:?}", result);

    let turtle = host.runtime.turtle();
    let (_, y) = turtle.borrow().position();
    assert!(y > 200.0, "move must not have completed, y = {}", y);
    assert!(y < 300.0, "move must have started, y = {}", y);
    assert!(
        host.sink.lines.borrow().is_empty(),
        "no statement after the interrupted one may run"
    );
}

#[test]
fn test_new_run_supersedes_interrupted_one() {
    let mut host = host_with_speed(1.0);
    host.clock.interrupt_after.set(Some(3));
    host.runtime
        .run("forward 100\nprint 'a'\n")
        .expect("interrupted run still returns cleanly");
    assert!(host.sink.lines.borrow().is_empty());

    // next run starts a new generation with a clear interrupt flag
    host.clock.interrupt_after.set(None);
    host.runtime.run("print 'b'\n").expect("second run works");
    assert_eq!(host.sink.lines.borrow().as_slice(), ["b (string)"]);
}

#[test]
fn test_interrupted_loop_stops_rechecking() {
    // the statement loop is the second line of defense: an interrupt seen
    // between iterations ends the loop
    let mut host = host_with_speed(1.0);
    host.clock.interrupt_after.set(Some(12));

    host.runtime
        .run("for i 100 do\nforward 10\nend\nprint 'done'\n")
        .expect("run returns");
    let turtle = host.runtime.turtle();
    assert!(
        turtle.borrow().segments().len() < 30,
        "loop must stop early, drew {} segments",
        turtle.borrow().segments().len()
    );
    assert!(host.sink.lines.borrow().is_empty());
}

// ==================== RUNS & PERSISTENCE ====================

#[test]
fn test_last_value_of_run_is_returned() {
    let result = eval("1 + 1\n2 + 2\n");
    match result {
        Ok(Value::Num(n)) => assert_eq!(n, 4.0),
        _ => panic!("Expected 4, got {:?}", result),
    }
}

#[test]
fn test_variables_reset_between_runs() {
    let mut host = host();
    host.runtime.run("x = 5\n").expect("first run");
    let result = host.runtime.run("(x)\n");
    assert!(result.is_err(), "x must not leak into the next run");
}

#[test]
fn test_functions_persist_between_runs() {
    let mut host = host();
    host.runtime
        .run("fn f() do\n42\nend\n")
        .expect("definition run");
    let result = host.runtime.run("y = [f]\n(y)\n");
    match result {
        Ok(Value::Num(n)) => assert_eq!(n, 42.0),
        _ => panic!("Expected 42, got {:?}", result),
    }
}
