use std::fmt::Write;

/// Render a total-seconds value the way the status bar displays it, e.g.
/// `"1 day 1 hour 1 min 1 sec"`. Units appear from the first non-zero unit
/// onward; seconds are always present. `day`/`hour` pluralize, `min`/`sec`
/// never do ("2 min", not "2 mins") - the display text depends on this exact
/// output, including the asymmetry.
pub fn format_duration(total_sec: u64) -> String {
    let days = total_sec / 86_400;
    let hours = (total_sec / 3_600) % 24;
    let minutes = (total_sec / 60) % 60;
    let seconds = total_sec % 60;

    let mut out = String::new();
    let mut found = false;
    if days != 0 {
        found = true;
        let _ = write!(out, "{} day", days);
        if days != 1 {
            out.push('s');
        }
    }
    if found || hours != 0 {
        if found {
            out.push(' ');
        }
        found = true;
        let _ = write!(out, "{} hour", hours);
        if hours != 1 {
            out.push('s');
        }
    }
    if found || minutes != 0 {
        if found {
            out.push(' ');
        }
        found = true;
        let _ = write!(out, "{} min", minutes);
    }
    if found {
        out.push(' ');
    }
    let _ = write!(out, "{} sec", seconds);
    out
}
