//! Output formatters.
//!
//! Each editor integration consumes the candidate list in its own
//! shape; these are pinned byte-for-byte by tests, so changes here are
//! protocol changes.

use std::io::{self, Write};

use crate::collector::Candidate;

pub type Formatter = fn(&mut dyn Write, &[Candidate], usize) -> io::Result<()>;

/// Look up a formatter; unknown names fall back to `nice`.
pub fn formatter_by_name(name: &str) -> Formatter {
    match name {
        "json" => json_format,
        "vim" => vim_format,
        "emacs" => emacs_format,
        "csv" => csv_format,
        "godit" => godit_format,
        _ => nice_format,
    }
}

/// Human-readable listing.
pub fn nice_format(w: &mut dyn Write, candidates: &[Candidate], _num: usize) -> io::Result<()> {
    writeln!(w, "Found {} candidates:", candidates.len())?;
    for c in candidates {
        writeln!(w, "  {c}")?;
    }
    Ok(())
}

/// `[prefix_len, [{"class": ..., "name": ..., "type": ...}, ...]]`.
pub fn json_format(w: &mut dyn Write, candidates: &[Candidate], num: usize) -> io::Result<()> {
    write!(w, "[{num}, [")?;
    for (i, c) in candidates.iter().enumerate() {
        if i > 0 {
            write!(w, ", ")?;
        }
        write!(
            w,
            "{{\"class\": {}, \"name\": {}, \"type\": {}}}",
            json_str(c.class.as_str()),
            json_str(&c.name),
            json_str(&c.typ),
        )?;
    }
    write!(w, "]]")
}

fn json_str(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| "\"\"".to_string())
}

/// Vim dictionary list: `[prefix_len, [{'word': ..., 'abbr': ..., 'info': ...}]]`.
pub fn vim_format(w: &mut dyn Write, candidates: &[Candidate], num: usize) -> io::Result<()> {
    write!(w, "[{num}, [")?;
    for (i, c) in candidates.iter().enumerate() {
        if i > 0 {
            write!(w, ", ")?;
        }
        let display = c.to_string();
        write!(
            w,
            "{{'word': '{}', 'abbr': '{display}', 'info': '{display}'}}",
            c.suggestion(),
        )?;
    }
    write!(w, "]]")
}

/// Newline-terminated `name,,type` lines.
pub fn emacs_format(w: &mut dyn Write, candidates: &[Candidate], _num: usize) -> io::Result<()> {
    for c in candidates {
        writeln!(w, "{},,{}", c.name, c.typ)?;
    }
    Ok(())
}

/// Newline-terminated `class,,name,,type` lines.
pub fn csv_format(w: &mut dyn Write, candidates: &[Candidate], _num: usize) -> io::Result<()> {
    for c in candidates {
        writeln!(w, "{},,{},,{}", c.class, c.name, c.typ)?;
    }
    Ok(())
}

/// godit's two-field protocol: a `prefix_len,,count` header, then one
/// `display,,insertion` line per candidate.
pub fn godit_format(w: &mut dyn Write, candidates: &[Candidate], num: usize) -> io::Result<()> {
    writeln!(w, "{num},,{}", candidates.len())?;
    for c in candidates {
        writeln!(w, "{c},,{}", c.suggestion())?;
    }
    Ok(())
}
