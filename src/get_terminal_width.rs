use terminal_size::{terminal_size, Width};

/// The width of the terminal on stdout minus `margin`, or 120 if
/// stdout is not a terminal. Used for wrapping `--help` output.
pub fn get_terminal_width(margin: usize) -> usize {
    if let Some((Width(width), _)) = terminal_size() {
        usize::from(width).saturating_sub(margin).max(40)
    } else {
        120
    }
}
