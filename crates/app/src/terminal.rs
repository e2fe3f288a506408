//! Line-based terminal front-end over `ui::App`.

use exam_core::model::{AttemptId, OptionMark};
use services::{CommitOutcome, Navigation};
use tokio::io::{AsyncBufReadExt, BufReader};
use ui::vm::{ReviewItemVm, time_fmt::format_timer};
use ui::{App, AppEvent, NavEvent, View, ViewState};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Help,
    Quit,
    Login(String, String),
    Logout,
    Dashboard,
    Menu,
    Attempts,
    Charts,
    Editor,
    Start(usize),
    Review(u64),
    Edit(usize),
    Option(usize),
    Next,
    Previous,
    Go(usize),
    Submit,
    Save,
    Unknown(String),
}

/// Inverse of the option labels: `a` is 0, `z` is 25, `aa` is 26.
fn label_index(label: &str) -> Option<usize> {
    if label.is_empty() || !label.chars().all(|c| c.is_ascii_lowercase()) {
        return None;
    }
    label
        .bytes()
        .try_fold(0usize, |acc, b| {
            acc.checked_mul(26)?.checked_add(usize::from(b - b'a') + 1)
        })
        .map(|n| n - 1)
}

fn parse(line: &str) -> Command {
    let words: Vec<&str> = line.split_whitespace().collect();
    let number = |i: usize| words.get(i).and_then(|w| w.parse::<usize>().ok());
    match words.as_slice() {
        ["help" | "?"] => Command::Help,
        ["quit" | "exit"] => Command::Quit,
        ["login", user, password] => Command::Login((*user).to_owned(), (*password).to_owned()),
        ["logout"] => Command::Logout,
        ["dashboard"] => Command::Dashboard,
        ["menu"] => Command::Menu,
        ["attempts"] => Command::Attempts,
        ["charts"] => Command::Charts,
        ["editor"] => Command::Editor,
        ["start", _] => number(1).map_or(Command::Unknown(line.to_owned()), Command::Start),
        ["edit", _] => number(1).map_or(Command::Unknown(line.to_owned()), Command::Edit),
        ["go", _] => number(1).map_or(Command::Unknown(line.to_owned()), Command::Go),
        ["review", id] => id
            .parse()
            .map_or(Command::Unknown(line.to_owned()), Command::Review),
        ["next" | "n"] => Command::Next,
        ["prev" | "p"] => Command::Previous,
        ["submit"] => Command::Submit,
        ["save"] => Command::Save,
        ["pick", label] | [label] => {
            label_index(&label.to_ascii_lowercase()).map_or(Command::Unknown(line.to_owned()), Command::Option)
        }
        _ => Command::Unknown(line.to_owned()),
    }
}

/// Read commands from stdin while the exam clock ticks, until `quit` or EOF.
///
/// # Errors
///
/// Returns an I/O error if stdin cannot be read.
pub async fn run(mut app: App) -> std::io::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    println!("Type `help` for commands.");
    render(&app);

    loop {
        tokio::select! {
            Some(event) = app.next_event() => match event {
                AppEvent::Tick(tick) => {
                    if app.on_tick(tick).await {
                        println!("Time is up.");
                        render(&app);
                    } else {
                        announce_time(&app);
                    }
                }
                AppEvent::Review(ready) => {
                    if app.complete_review(ready) {
                        render(&app);
                    }
                }
            },
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if line.trim().is_empty() {
                    continue;
                }
                match parse(&line) {
                    Command::Quit => break,
                    command => {
                        handle(&mut app, command).await;
                        render(&app);
                    }
                }
            }
        }
    }
    Ok(())
}

async fn handle(app: &mut App, command: Command) {
    let outcome: Result<(), String> = match command {
        Command::Help => {
            print_help();
            Ok(())
        }
        Command::Quit => Ok(()),
        Command::Login(user, password) => app
            .login(&user, &password)
            .await
            .map_err(|e| e.message()),
        Command::Logout => navigate(app, NavEvent::Logout).await,
        Command::Dashboard => navigate(app, NavEvent::OpenDashboard).await,
        Command::Menu => navigate(app, NavEvent::OpenMenu).await,
        Command::Attempts => navigate(app, NavEvent::OpenAttempts).await,
        Command::Charts => navigate(app, NavEvent::OpenCharts).await,
        Command::Editor => navigate(app, NavEvent::OpenEditor).await,
        Command::Start(n) => match menu_test(app, n) {
            Some(test_id) => app.start_exam(test_id).await.map_err(|e| e.to_string()),
            None => Err(format!("no test number {n}")),
        },
        Command::Edit(n) => match menu_test(app, n) {
            Some(test_id) => navigate(app, NavEvent::EditTest(test_id)).await,
            None => Err(format!("no test number {n}")),
        },
        Command::Review(id) => navigate(app, NavEvent::ReviewAttempt(AttemptId::new(id))).await,
        Command::Option(index) => match app.view() {
            View::Exam => app.choose(index).map_err(|e| e.message()),
            View::EditQuestions => app.choose_pending(index).map_err(|e| e.message()),
            _ => Err("nothing to choose here".into()),
        },
        Command::Next => step(app, true),
        Command::Previous => step(app, false),
        Command::Go(n) => app
            .jump_to(n.saturating_sub(1))
            .map_err(|e| e.message()),
        Command::Submit => app.submit().await.map_err(|e| e.message()),
        Command::Save => match app.commit_edit().await {
            Ok(CommitOutcome::EndOfSet) => {
                println!("Saved. That was the last question.");
                Ok(())
            }
            Ok(_) => {
                println!("Saved.");
                Ok(())
            }
            Err(e) => Err(e.message()),
        },
        Command::Unknown(line) => Err(format!("unknown command: {line}")),
    };
    if let Err(message) = outcome {
        println!("! {message}");
    }
}

async fn navigate(app: &mut App, event: NavEvent) -> Result<(), String> {
    app.navigate(event).await.map_err(|e| e.to_string())
}

fn menu_test(app: &App, number: usize) -> Option<exam_core::model::TestId> {
    app.menu()
        .into_iter()
        .find(|entry| entry.number == number)
        .map(|entry| entry.id)
}

fn step(app: &mut App, forward: bool) -> Result<(), String> {
    match app.view() {
        View::Exam => {
            if forward {
                app.next_question();
            } else {
                app.previous_question();
            }
            Ok(())
        }
        View::EditQuestions => {
            let moved = if forward {
                app.edit_next()
            } else {
                app.edit_previous()
            };
            match moved.map_err(|e| e.message())? {
                Navigation::EndOfSet => println!("End of set."),
                Navigation::AtStart => println!("Already at the first question."),
                Navigation::Moved(_) => {}
            }
            Ok(())
        }
        _ => Err("nothing to move through here".into()),
    }
}

fn announce_time(app: &App) {
    if app.view() != View::Exam || app.exam_vm().is_none() {
        return;
    }
    let remaining = app.exam().remaining_secs();
    if remaining % 30 == 0 || remaining <= 10 {
        println!("Time left: {}", format_timer(remaining));
    }
}

// ─── Rendering ─────────────────────────────────────────────────────────────

fn render(app: &App) {
    println!();
    match app.view() {
        View::Login => println!("Log in with: login <username> <password>"),
        View::Dashboard => render_state(app.dashboard(), |d| {
            println!("Dashboard");
            println!("  Attempts: {}", d.attempts);
            println!("  Best score: {}", d.best);
            println!("  Average score: {}", d.average);
        }),
        View::Menu => {
            println!("Choose a test (start <n>):");
            for entry in app.menu() {
                let note = if entry.enabled { "" } else { " (unavailable)" };
                println!("  {}. {}{note}", entry.number, entry.title);
            }
        }
        View::Exam => render_exam(app),
        View::Attempts => render_state(app.attempts(), |rows| {
            if rows.is_empty() {
                println!("No attempts yet.");
            }
            for row in rows {
                println!(
                    "  #{}  {}  {}  {}",
                    row.id, row.title, row.attempted_at, row.score
                );
            }
            println!("Open one with: review <id>");
        }),
        View::ReviewAttempt => render_state(app.review(), |review| {
            println!("{}: {} / {} correct", review.title, review.correct, review.total);
            review.items.iter().for_each(render_review_item);
        }),
        View::Charts => render_state(app.chart(), |chart| {
            if chart.is_empty() {
                println!("No attempts to chart.");
            }
            for point in &chart.points {
                let bar = "#".repeat(usize::try_from(point.score).unwrap_or(0));
                println!("  {}  {bar} {}", point.label, point.score);
            }
        }),
        View::SelectEditTest => {
            println!("Choose a test to edit (edit <n>):");
            for entry in app.menu().into_iter().filter(|e| e.enabled) {
                println!("  {}. {}", entry.number, entry.title);
            }
        }
        View::EditQuestions => match app.edit_vm() {
            Some(vm) => {
                println!("{} - editing answers", vm.title);
                println!("{}", vm.position);
                println!("{}", vm.question);
                for opt in &vm.options {
                    let pending = if opt.pending { ">" } else { " " };
                    let canonical = if opt.canonical { " (current answer)" } else { "" };
                    println!(" {pending} {}) {}{canonical}", opt.label, opt.text);
                }
                if vm.at_end {
                    println!("End of set. Use `p` to go back or `menu` to leave.");
                }
            }
            None => println!("No test loaded."),
        },
    }
    if let Some(notice) = app.notice() {
        println!("! {}", notice.message());
    }
}

fn render_state<T>(state: &ViewState<T>, ready: impl FnOnce(&T)) {
    match state {
        ViewState::Idle | ViewState::Loading => println!("Loading..."),
        ViewState::Ready(value) => ready(value),
        ViewState::Error(err) => println!("! {}", err.message()),
    }
}

fn render_exam(app: &App) {
    if let Some(vm) = app.exam_vm() {
        println!("{}    Time left: {}", vm.title, vm.timer);
        println!("{}", vm.position);
        println!("{}", vm.question);
        for opt in &vm.options {
            let marker = if opt.selected { "(x)" } else { "( )" };
            println!("  {marker} {}) {}", opt.label, opt.text);
        }
        println!("{}", vm.navigator_line());
        if vm.submitting {
            println!("Submitting...");
        }
    } else if let Some(score) = app.score_vm() {
        println!("{}: {}", score.title, score.headline);
        score.items.iter().for_each(render_review_item);
    } else if app.notice().is_none() {
        println!("Loading...");
    }
}

fn render_review_item(item: &ReviewItemVm) {
    println!("{}. {}  [{}]", item.number, item.text, item.verdict.label());
    for (opt, line) in item.options.iter().zip(item.option_lines()) {
        let lead = if opt.mark == OptionMark::Plain { "   " } else { " * " };
        println!("{lead}{line}");
    }
}

fn print_help() {
    println!("Commands:");
    println!("  login <user> <password>, logout, quit");
    println!("  dashboard, menu, attempts, charts, editor");
    println!("  start <n>        begin test n from the menu");
    println!("  a, b, c ...      choose an option");
    println!("  n / p, go <k>    next, previous, jump to question k");
    println!("  submit           submit the exam");
    println!("  review <id>      review a past attempt");
    println!("  edit <n>, save   correct the answer key of test n");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_map_back_to_indices() {
        assert_eq!(label_index("a"), Some(0));
        assert_eq!(label_index("d"), Some(3));
        assert_eq!(label_index("aa"), Some(26));
        assert_eq!(label_index("A1"), None);
    }

    #[test]
    fn parses_commands() {
        assert_eq!(
            parse("login ana pw"),
            Command::Login("ana".into(), "pw".into())
        );
        assert_eq!(parse("start 2"), Command::Start(2));
        assert_eq!(parse("C"), Command::Option(2));
        assert_eq!(parse("pick b"), Command::Option(1));
        assert_eq!(parse("n"), Command::Next);
        assert_eq!(parse("review x"), Command::Unknown("review x".into()));
    }
}
