use anyhow::Result;
use clap::Parser as ClapParser;
use rustyline::DefaultEditor;
use std::fs;
use std::rc::Rc;
use trtl::config::{RuntimeConfig, DEFAULT_FPS, DEFAULT_SPEED};
use trtl::console::{PrintSink, StdoutSink};
use trtl::diagnostics;
use trtl::interpreter::exec::{Clock, FrameClock};
use trtl::interpreter::value::Value;
use trtl::keywords::load_keywords;
use trtl::runtime::Runtime;

#[derive(ClapParser)]
#[command(name = "trtl")]
#[command(about = "The trtl turtle-graphics scripting language")]
struct Cli {
    /// Script file to run (omit for REPL)
    script: Option<String>,

    /// Path to keywords JSON file
    #[arg(short, long)]
    keywords: Option<String>,

    /// Units an animated turtle move covers per frame (negative = instant)
    #[arg(long, default_value_t = DEFAULT_SPEED)]
    speed: f64,

    /// Skip animation entirely
    #[arg(long)]
    instant: bool,

    /// Frames per second for animated builtins
    #[arg(long, default_value_t = DEFAULT_FPS)]
    fps: u32,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let keywords = load_keywords(cli.keywords.as_deref())?;
    let speed = if cli.instant { -1.0 } else { cli.speed };
    let config = RuntimeConfig {
        speed,
        ..Default::default()
    };

    let sink: Rc<dyn PrintSink> = Rc::new(StdoutSink);
    let clock: Rc<dyn Clock> = Rc::new(FrameClock::new(cli.fps));
    let mut runtime = Runtime::new(config, keywords, sink, clock);

    match cli.script {
        None => run_prompt(&mut runtime)?,
        Some(path) => run_file(&path, &mut runtime)?,
    }

    Ok(())
}

fn run_prompt(runtime: &mut Runtime) -> Result<()> {
    let mut rl = DefaultEditor::new()?;
    let mut buffer = String::new();

    let history_path = dirs::home_dir().map(|p| p.join(".trtl_history"));
    if let Some(ref path) = history_path {
        let _ = rl.load_history(path);
    }

    loop {
        let prompt = if buffer.is_empty() { "> " } else { "| " };

        match rl.readline(prompt) {
            Ok(line) => {
                buffer.push_str(&line);
                buffer.push('\n');

                if is_complete(&buffer) {
                    if !buffer.trim().is_empty() {
                        let _ = rl.add_history_entry(buffer.trim());
                        run(&buffer, runtime);
                    }
                    buffer.clear();
                }
            }
            Err(rustyline::error::ReadlineError::Eof) => break,
            Err(rustyline::error::ReadlineError::Interrupted) => {
                buffer.clear();
                println!("^C");
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                break;
            }
        }
    }

    if let Some(ref path) = history_path {
        let _ = rl.save_history(path);
    }

    Ok(())
}

/// A buffer is complete when every 'do' has its 'end' and no string is left
/// open, so multi-line blocks can be typed at the prompt.
fn is_complete(code: &str) -> bool {
    let mut depth: i32 = 0;
    let mut in_string = false;
    let mut quote = '"';
    let mut word = String::new();

    let close_word = |word: &mut String, depth: &mut i32| {
        match word.as_str() {
            "do" => *depth += 1,
            "end" => *depth -= 1,
            _ => {}
        }
        word.clear();
    };

    let mut iter = code.chars().peekable();
    while let Some(c) = iter.next() {
        if in_string {
            if c == quote {
                in_string = false;
            } else if c == '\n' {
                // unterminated string on this line; the scanner will
                // report the error, don't keep the prompt open for it
                in_string = false;
            }
            continue;
        }

        match c {
            '"' | '\'' => {
                close_word(&mut word, &mut depth);
                in_string = true;
                quote = c;
            }
            '#' => {
                close_word(&mut word, &mut depth);
                while let Some(&next) = iter.peek() {
                    if next == '\n' {
                        break;
                    }
                    iter.next();
                }
            }
            c if c.is_alphanumeric() || c == '_' => word.push(c),
            _ => close_word(&mut word, &mut depth),
        }
    }
    close_word(&mut word, &mut depth);

    depth <= 0 && !in_string
}

fn run_file(path: &str, runtime: &mut Runtime) -> Result<()> {
    let contents = fs::read_to_string(path)?;
    run(&contents, runtime);
    Ok(())
}

fn run(source: &str, runtime: &mut Runtime) {
    match runtime.run(source) {
        Ok(Value::Null) => {}
        Ok(value) => println!("{}", value),
        Err(e) => {
            let hint = diagnostics::suggest_hint(&e.message);
            eprint!(
                "{}",
                diagnostics::render(source, e.stage.as_str(), e.span, &e.message, hint.as_deref())
            );
        }
    }
}
