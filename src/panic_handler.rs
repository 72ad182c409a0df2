use crossterm::{
    cursor::Show,
    event::DisableBracketedPaste,
    execute,
    terminal::{LeaveAlternateScreen, disable_raw_mode},
};
use std::io::{self, Write};
use std::panic;

/// Install a hook that puts the terminal back before the panic is printed.
/// Worker threads panic through the same hook, so a dead render or question
/// worker also takes the UI down cleanly instead of leaving raw mode on.
pub fn initialize_panic_handler() {
    better_panic::install();

    let default_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        restore_terminal();

        let thread = std::thread::current();
        log::error!(
            "Panic in thread {}: {panic_info}",
            thread.name().unwrap_or("<unnamed>")
        );

        default_hook(panic_info);
        std::process::exit(1);
    }));
}

/// Leave raw mode and the alternate screen, stop bracketed paste and show
/// the cursor. Errors are ignored; this runs on the way out.
pub fn restore_terminal() {
    let _ = disable_raw_mode();
    let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableBracketedPaste);
    let _ = execute!(io::stderr(), Show);
    let _ = writeln!(io::stderr());
}
