use std::io::Write;
use std::sync::{Arc, Mutex};

use clap::Args;
use focustrack_core::{
    AppActivity, Command, ConfigFile, Database, DecisionToken, Event, Input, LifecycleMonitor,
    Mode, Prompt, PromptSurface, TimerDriver,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::debug;

#[derive(Args)]
pub struct RunArgs {
    /// Mode to begin in (work, short, long)
    #[arg(long)]
    mode: Option<Mode>,
    /// Start counting down immediately
    #[arg(long)]
    start: bool,
}

const HELP: &str = "\
commands:
  s, start        start or continue
  p, pause        pause
  stop            end the interval early (asks first); stop! skips the question
  reset           back to the start of the interval without saving
  cycle           reset the long-break cycle
  work | short | long
                  switch mode (not while running)
  +N / -N         lengthen or shorten an idle interval by N minutes
  bg | inactive | fg
                  report that the app left or returned to the foreground
  1, 2, ...       answer the open question; x dismisses it
  status          print the current state
  q, quit         leave";

/// Latest question shown on the terminal.
#[derive(Debug, Clone, Copy)]
struct OpenQuestion {
    token: DecisionToken,
    options: usize,
}

type SharedQuestion = Arc<Mutex<Option<OpenQuestion>>>;

/// Prints prompts and remembers the token so the next numeric answer can
/// be routed back to it.
struct TerminalPrompt {
    open: SharedQuestion,
}

impl PromptSurface for TerminalPrompt {
    fn present(&mut self, token: DecisionToken, prompt: &Prompt) {
        println!();
        println!("{}", prompt.title);
        println!("  {}", prompt.message);
        for (i, option) in prompt.options.iter().enumerate() {
            let mark = if option.is_destructive { " (!)" } else { "" };
            println!("  [{}] {}{mark}", i + 1, option.label);
        }
        if let Ok(mut open) = self.open.lock() {
            *open = Some(OpenQuestion {
                token,
                options: prompt.options.len(),
            });
        }
    }
}

pub fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(session(args));
    // stdin is read on a blocking thread that cannot be cancelled
    runtime.shutdown_background();
    result
}

async fn session(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = ConfigFile::default_location()?;
    let store = Database::open()?;
    let open: SharedQuestion = Arc::default();

    let (queue, inbox) = mpsc::unbounded_channel();
    let (events_tx, events) = mpsc::unbounded_channel();

    let driver = TimerDriver::new(
        config.clone(),
        config,
        store,
        TerminalPrompt { open: open.clone() },
        queue.clone(),
        events_tx,
    );

    if let Some(mode) = args.mode {
        queue.send(Input::Command(Command::SwitchMode(mode)))?;
    }
    if args.start {
        queue.send(Input::Command(Command::Start))?;
    }

    println!("{HELP}");
    let printer = tokio::spawn(print_events(events, open.clone()));
    tokio::spawn(read_commands(queue, open));

    let driver = driver.run(inbox).await;
    drop(driver);
    if let Err(e) = printer.await {
        debug!(error = %e, "event printer ended abnormally");
    }
    Ok(())
}

async fn read_commands(queue: UnboundedSender<Input>, open: SharedQuestion) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut monitor = LifecycleMonitor::default();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                debug!(error = %e, "stdin closed");
                break;
            }
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "help" || line == "?" {
            println!("{HELP}");
            continue;
        }

        match parse_line(line, &open, &mut monitor) {
            Parsed::Input(input) => {
                let quit = input == Input::Shutdown;
                if queue.send(input).is_err() || quit {
                    return;
                }
            }
            Parsed::Nothing => {}
            Parsed::NoQuestion => println!("no open question"),
            Parsed::Unknown => println!("unknown command '{line}' (type 'help')"),
        }
    }
    if queue.send(Input::Shutdown).is_err() {
        debug!("driver already stopped");
    }
}

#[derive(Debug, PartialEq)]
enum Parsed {
    Input(Input),
    /// Understood, but changes nothing (e.g. a repeated lifecycle report).
    Nothing,
    /// An answer arrived while no question is open.
    NoQuestion,
    Unknown,
}

fn parse_line(line: &str, open: &SharedQuestion, monitor: &mut LifecycleMonitor) -> Parsed {
    let command = |c| Parsed::Input(Input::Command(c));
    let lifecycle = |monitor: &mut LifecycleMonitor, activity| match monitor.observe(activity) {
        Some(transition) => Parsed::Input(Input::Lifecycle(transition)),
        None => Parsed::Nothing,
    };

    match line {
        "s" | "start" => command(Command::Start),
        "p" | "pause" => command(Command::Pause),
        "stop" => command(Command::Stop),
        "stop!" => command(Command::StopNow),
        "reset" => command(Command::Reset),
        "cycle" => command(Command::ResetCycle),
        "status" => command(Command::Status),
        "bg" | "background" => lifecycle(monitor, AppActivity::Background),
        "inactive" => lifecycle(monitor, AppActivity::Inactive),
        "fg" | "foreground" => lifecycle(monitor, AppActivity::Active),
        "q" | "quit" | "exit" => Parsed::Input(Input::Shutdown),
        "x" => answer(open, None),
        _ => {
            if let Ok(mode) = line.parse::<Mode>() {
                return command(Command::SwitchMode(mode));
            }
            if line.starts_with('+') || line.starts_with('-') {
                return match line.parse::<i64>() {
                    Ok(delta) => command(Command::AdjustDuration(delta)),
                    Err(_) => Parsed::Unknown,
                };
            }
            match line.parse::<usize>() {
                Ok(n) if n >= 1 => answer(open, Some(n - 1)),
                _ => Parsed::Unknown,
            }
        }
    }
}

fn answer(open: &SharedQuestion, choice: Option<usize>) -> Parsed {
    let question = open.lock().ok().and_then(|mut q| q.take());
    match question {
        Some(q) if choice.map_or(true, |c| c < q.options) => Parsed::Input(Input::Decision {
            token: q.token,
            choice,
        }),
        Some(q) => {
            // keep the question open for a valid answer
            if let Ok(mut open) = open.lock() {
                *open = Some(q);
            }
            Parsed::Unknown
        }
        None => Parsed::NoQuestion,
    }
}

/// Drops the open question once the timer moves on without it being answered.
///
/// Events reach the printer after the driver has moved on, so a question is
/// only dropped if its own `DecisionRequested` came before the event.
fn forget_question_on(event: &Event, open: &SharedQuestion, announced: &mut Option<DecisionToken>) {
    match event {
        Event::DecisionRequested { token, .. } => *announced = Some(*token),
        Event::TimerReset { .. } | Event::ModeSwitched { .. } | Event::TimerStopped { .. } => {
            if let Ok(mut open) = open.lock() {
                if open.is_some_and(|q| Some(q.token) <= *announced) {
                    *open = None;
                }
            }
        }
        _ => {}
    }
}

fn clock(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

async fn print_events(mut events: UnboundedReceiver<Event>, open: SharedQuestion) {
    let mut stdout = std::io::stdout();
    let mut announced = None;
    while let Some(event) = events.recv().await {
        forget_question_on(&event, &open, &mut announced);
        match event {
            Event::Ticked { remaining_secs, .. } => {
                print!("\r  {}  ", clock(remaining_secs));
                if let Err(e) = stdout.flush() {
                    debug!(error = %e, "stdout flush failed");
                }
                continue;
            }
            Event::StateSnapshot { state, .. } => println!(
                "{} | {:?} | {} left | interruptions: {} | completed: {}",
                state.mode,
                state.phase,
                clock(state.remaining_secs),
                state.interruption_count,
                state.completed_work_intervals
            ),
            Event::TimerStarted {
                mode,
                remaining_secs,
                ..
            } => println!("{mode} started, {} to go", clock(remaining_secs)),
            Event::TimerPaused { remaining_secs, .. } => {
                println!("\npaused at {}", clock(remaining_secs));
            }
            Event::TimerInterrupted {
                interruption_count, ..
            } => println!("\ninterrupted ({interruption_count} so far this interval)"),
            Event::TimerResumed { remaining_secs, .. } => {
                println!("resumed, {} to go", clock(remaining_secs));
            }
            Event::IntervalCompleted { mode, vibrate, .. } => {
                let bell = if vibrate { "\x07" } else { "" };
                println!("\n{mode} finished{bell}");
            }
            Event::ModeSwitched {
                mode,
                total_secs,
                auto_started,
                ..
            } => {
                let how = if auto_started { "started" } else { "ready" };
                println!("{mode} {how} ({})", clock(total_secs));
            }
            Event::DurationAdjusted { total_secs, .. } => {
                println!("interval is now {}", clock(total_secs));
            }
            Event::TimerStopped {
                mode, elapsed_secs, ..
            } => println!("\n{mode} stopped after {}", clock(elapsed_secs)),
            Event::TimerReset { mode, .. } => println!("\n{mode} reset"),
            Event::CycleReset { .. } => println!("long-break cycle reset"),
            Event::SessionSaved { record, .. } => println!(
                "saved {} min of {}",
                record.duration_minutes, record.category
            ),
            Event::SessionSaveFailed { message, record } => println!(
                "could not save {} min of {}: {message}",
                record.duration_minutes, record.category
            ),
            // the prompt surface already printed the question
            Event::DecisionRequested { .. } => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use focustrack_core::{DecisionKind, LifecycleTransition};

    fn question(options: usize) -> SharedQuestion {
        Arc::new(Mutex::new(Some(OpenQuestion {
            token: DecisionToken(7),
            options,
        })))
    }

    #[test]
    fn parses_commands_and_modes() {
        let open = SharedQuestion::default();
        let mut monitor = LifecycleMonitor::default();
        assert_eq!(
            parse_line("s", &open, &mut monitor),
            Parsed::Input(Input::Command(Command::Start))
        );
        assert_eq!(
            parse_line("long", &open, &mut monitor),
            Parsed::Input(Input::Command(Command::SwitchMode(Mode::LongBreak)))
        );
        assert_eq!(
            parse_line("-3", &open, &mut monitor),
            Parsed::Input(Input::Command(Command::AdjustDuration(-3)))
        );
        assert_eq!(parse_line("dance", &open, &mut monitor), Parsed::Unknown);
    }

    #[test]
    fn lifecycle_reports_only_fire_on_edges() {
        let open = SharedQuestion::default();
        let mut monitor = LifecycleMonitor::default();
        assert_eq!(
            parse_line("inactive", &open, &mut monitor),
            Parsed::Input(Input::Lifecycle(LifecycleTransition::BecameBackground))
        );
        assert_eq!(parse_line("bg", &open, &mut monitor), Parsed::Nothing);
        assert_eq!(
            parse_line("fg", &open, &mut monitor),
            Parsed::Input(Input::Lifecycle(LifecycleTransition::BecameForeground))
        );
    }

    #[test]
    fn numbers_answer_the_open_question_once() {
        let open = question(2);
        let mut monitor = LifecycleMonitor::default();
        assert_eq!(parse_line("3", &open, &mut monitor), Parsed::Unknown);
        assert_eq!(
            parse_line("2", &open, &mut monitor),
            Parsed::Input(Input::Decision {
                token: DecisionToken(7),
                choice: Some(1)
            })
        );
        assert_eq!(parse_line("1", &open, &mut monitor), Parsed::NoQuestion);
    }

    #[test]
    fn x_dismisses() {
        let open = question(2);
        let mut monitor = LifecycleMonitor::default();
        assert_eq!(
            parse_line("x", &open, &mut monitor),
            Parsed::Input(Input::Decision {
                token: DecisionToken(7),
                choice: None
            })
        );
    }

    #[test]
    fn reset_stop_and_switch_close_an_announced_question() {
        let at = chrono::Utc::now();
        let requested = Event::DecisionRequested {
            token: DecisionToken(7),
            decision: DecisionKind::ConfirmStop,
            prompt: Prompt {
                title: "Stop?".into(),
                message: String::new(),
                options: Vec::new(),
            },
        };
        let moved_on = [
            Event::TimerReset { mode: Mode::Work, at },
            Event::TimerStopped {
                mode: Mode::Work,
                elapsed_secs: 90,
                at,
            },
            Event::ModeSwitched {
                mode: Mode::ShortBreak,
                total_secs: 300,
                auto_started: false,
                at,
            },
        ];
        for event in &moved_on {
            let open = question(2);
            let mut announced = None;
            forget_question_on(&requested, &open, &mut announced);
            forget_question_on(event, &open, &mut announced);
            let mut monitor = LifecycleMonitor::default();
            assert_eq!(parse_line("1", &open, &mut monitor), Parsed::NoQuestion);
        }
    }

    #[test]
    fn late_reset_keeps_a_newer_question() {
        let open = question(2);
        let mut announced = Some(DecisionToken(6));
        let reset = Event::TimerReset {
            mode: Mode::Work,
            at: chrono::Utc::now(),
        };
        forget_question_on(&reset, &open, &mut announced);
        assert_eq!(open.lock().unwrap().map(|q| q.token), Some(DecisionToken(7)));
    }

    #[test]
    fn clock_formats_minutes_and_seconds() {
        assert_eq!(clock(0), "00:00");
        assert_eq!(clock(25 * 60), "25:00");
        assert_eq!(clock(61), "01:01");
    }
}
