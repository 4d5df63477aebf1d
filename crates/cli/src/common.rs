use std::time::Instant;

/// Run a command body, printing its error to stderr. Returns the exit code.
pub fn run_command<F>(f: F) -> i32
where
    F: FnOnce() -> Result<(), String>,
{
    match f() {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("{err}");
            1
        }
    }
}

pub fn format_elapsed_ms(start: Instant) -> String {
    let elapsed = start.elapsed();
    if elapsed.as_secs() == 0 {
        return format!("{}ms", elapsed.as_millis());
    }
    let seconds = elapsed.as_secs();
    let remaining_ms = elapsed.subsec_millis();
    format!("{seconds}s {remaining_ms}ms")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_command_exit_codes() {
        assert_eq!(run_command(|| Ok(())), 0);
        assert_eq!(run_command(|| Err("boom".into())), 1);
    }

    #[test]
    fn test_format_elapsed_ms_sub_second() {
        assert!(format_elapsed_ms(Instant::now()).ends_with("ms"));
    }
}
