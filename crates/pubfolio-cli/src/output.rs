use std::io::Write;

use owo_colors::OwoColorize;
use pubfolio_core::{FetchFailure, Publication, RenderOptions};

/// Whether to use colored output.
#[derive(Debug, Clone, Copy)]
pub struct ColorMode(pub bool);

impl ColorMode {
    pub fn enabled(&self) -> bool {
        self.0
    }
}

/// Print one line per paper, newest first.
///
/// Papers with the skipped `publtype` are omitted unless `all` is set, in
/// which case they are printed dimmed.
pub fn print_listing(
    w: &mut dyn Write,
    papers: &[Publication],
    options: &RenderOptions,
    all: bool,
    color: ColorMode,
) -> std::io::Result<usize> {
    let mut printed = 0;
    for paper in papers {
        let skipped = paper.publtype() == Some(options.skip_publtype.as_str());
        if skipped && !all {
            continue;
        }

        let line = paper.summary();
        if !color.enabled() {
            writeln!(w, "{}", line)?;
        } else if skipped {
            writeln!(w, "{}", line.dimmed())?;
        } else {
            writeln!(
                w,
                "{} in {} {}",
                paper.title().unwrap_or("(untitled)").bold(),
                paper.venue().unwrap_or("?"),
                format!("({})", paper.text_of("year").unwrap_or("?")).cyan()
            )?;
        }
        printed += 1;
    }
    Ok(printed)
}

/// Print the persons that could not be fetched.
pub fn print_failures(
    w: &mut dyn Write,
    failures: &[FetchFailure],
    color: ColorMode,
) -> std::io::Result<()> {
    for failure in failures {
        let msg = failure.message();
        if color.enabled() {
            writeln!(w, "{} {}", "WARNING:".yellow(), msg)?;
        } else {
            writeln!(w, "WARNING: {}", msg)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use pubfolio_core::{FetchError, PaperKind, ShapeError};
    use serde_json::json;

    use super::*;

    fn paper(key: &str, publtype: Option<&str>) -> Publication {
        let mut fields = json!({
            "key": key,
            "title": {"#text": format!("Paper {key}.")},
            "journal": {"#text": "J"},
            "year": {"#text": "2020"}
        });
        if let Some(publtype) = publtype {
            fields["publtype"] = json!(publtype);
        }
        Publication::new(PaperKind::Article, fields.as_object().unwrap().clone()).unwrap()
    }

    #[test]
    fn listing_hides_informal_by_default() {
        let papers = vec![paper("a", None), paper("b", Some("informal"))];
        let mut out = Vec::new();
        let n = print_listing(
            &mut out,
            &papers,
            &RenderOptions::default(),
            false,
            ColorMode(false),
        )
        .unwrap();

        assert_eq!(n, 1);
        assert_eq!(String::from_utf8(out).unwrap(), "Paper a. in J (2020)\n");
    }

    #[test]
    fn listing_all_includes_informal() {
        let papers = vec![paper("a", None), paper("b", Some("informal"))];
        let mut out = Vec::new();
        let n = print_listing(
            &mut out,
            &papers,
            &RenderOptions::default(),
            true,
            ColorMode(false),
        )
        .unwrap();
        assert_eq!(n, 2);
    }

    #[test]
    fn failures_plain() {
        let failures = vec![FetchFailure::new(
            "1/2",
            FetchError::Shape(ShapeError::MissingPath("dblpperson")),
        )];
        let mut out = Vec::new();
        print_failures(&mut out, &failures, ColorMode(false)).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("WARNING: could not read publications of 1/2"));
    }
}
