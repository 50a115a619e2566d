//! PEP 723 metadata block location and merging
//!
//! A script declares its dependencies in a fenced comment block at the top
//! of the file:
//!
//! ```text
//! # /// script
//! # requires-python = ">=3.12"
//! # dependencies = [
//! #   "httpx",
//! # ]
//! # ///
//! ```
//!
//! The merge is a pure text transform: locate the first block in the
//! leading comment region, replace exactly the `dependencies` field, and
//! leave every other byte of the file alone. When no block exists, a fresh
//! one is synthesized at the top of the file (below the shebang, which
//! always stays on the first line). Merging is idempotent: re-merging its
//! own output changes nothing.

use std::sync::LazyLock;

use regex::Regex;

/// Opening sentinel of a script metadata block.
pub const BLOCK_START: &str = "# /// script";
/// Closing sentinel.
pub const BLOCK_END: &str = "# ///";
/// requires-python specifier used when synthesizing a new block.
pub const DEFAULT_REQUIRES_PYTHON: &str = ">=3.12";

static DEP_OPEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#\s*dependencies\s*=\s*\[").expect("DEP_OPEN regex is invalid")
});

static DEP_CLOSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#\s*\]").expect("DEP_CLOSE regex is invalid"));

/// Merge `third_party` into the file's metadata block.
///
/// `third_party` is expected sorted and deduplicated; it is serialized one
/// quoted entry per line. An empty set still produces the field with an
/// empty list; the field is always present, only its contents vary.
pub fn merge_metadata(source: &str, third_party: &[String], requires_python: &str) -> String {
    match locate_block(source) {
        Some(span) => replace_dependencies(source, span, third_party),
        None => insert_block(source, third_party, requires_python),
    }
}

/// Byte span of the first metadata block: start of the opening marker line
/// through the end of the closing marker line, terminator included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BlockSpan {
    start: usize,
    end: usize,
}

/// Strip the terminator a `split_inclusive('\n')` segment carries.
fn content_of(raw: &str) -> &str {
    let line = raw.strip_suffix('\n').unwrap_or(raw);
    line.strip_suffix('\r').unwrap_or(line)
}

/// Find the first metadata block in the leading comment region.
///
/// The region may hold a shebang on the first line, blank lines, and `#`
/// comments; the first executable line ends the search. A block whose
/// comment run is interrupted before the closing marker is malformed and
/// reported as absent.
fn locate_block(source: &str) -> Option<BlockSpan> {
    let mut offset = 0;
    let mut start: Option<usize> = None;
    for raw in source.split_inclusive('\n') {
        let line = content_of(raw);
        match start {
            None => {
                if line.trim_end() == BLOCK_START {
                    start = Some(offset);
                } else if !(line.trim().is_empty() || line.starts_with('#')) {
                    // First executable line; the shebang and plain comments
                    // fall through as part of the leading region.
                    return None;
                }
            }
            Some(block_start) => {
                if line.trim_end() == BLOCK_END {
                    return Some(BlockSpan {
                        start: block_start,
                        end: offset + raw.len(),
                    });
                }
                if !line.starts_with('#') {
                    return None;
                }
            }
        }
        offset += raw.len();
    }
    None
}

/// Canonical serialization of the dependency list.
fn render_dependencies(deps: &[String]) -> String {
    let mut out = String::from("# dependencies = [\n");
    for dep in deps {
        out.push_str("#   \"");
        out.push_str(dep);
        out.push_str("\",\n");
    }
    out.push_str("# ]\n");
    out
}

/// A complete fresh block.
fn render_block(deps: &[String], requires_python: &str) -> String {
    let mut block = String::from(BLOCK_START);
    block.push('\n');
    block.push_str("# requires-python = \"");
    block.push_str(requires_python);
    block.push_str("\"\n");
    block.push_str(&render_dependencies(deps));
    block.push_str(BLOCK_END);
    block.push('\n');
    block
}

/// Insert a fresh block at the top of the file.
///
/// A shebang stays on the first line with the block directly below it; one
/// blank line separates the block from the original content.
fn insert_block(source: &str, deps: &[String], requires_python: &str) -> String {
    let block = render_block(deps, requires_python);
    let (head, rest) = if source.starts_with("#!") {
        match source.find('\n') {
            Some(eol) => source.split_at(eol + 1),
            None => return format!("{source}\n{block}"),
        }
    } else {
        ("", source)
    };
    if rest.is_empty() {
        format!("{head}{block}")
    } else {
        format!("{head}{block}\n{rest}")
    }
}

/// Replace the dependencies field inside an existing block, leaving every
/// other byte of the file untouched.
fn replace_dependencies(source: &str, span: BlockSpan, deps: &[String]) -> String {
    let block = &source[span.start..span.end];
    let rendered = render_dependencies(deps);

    let mut offset = 0;
    let mut field: Option<(usize, usize)> = None;
    let mut open: Option<(usize, usize)> = None;
    for raw in block.split_inclusive('\n') {
        let line = content_of(raw);
        if let Some((field_start, _)) = open {
            if DEP_CLOSE.is_match(line) {
                field = Some((field_start, offset + raw.len()));
                break;
            }
        } else if DEP_OPEN.is_match(line) {
            if line.contains(']') {
                // Inline form: the whole field sits on this line.
                field = Some((offset, offset + raw.len()));
                break;
            }
            open = Some((offset, offset + raw.len()));
        }
        offset += raw.len();
    }

    // A list that never closes is replaced at its opening line, which also
    // heals the block into the canonical form.
    let field = field.or(open);

    let (field_start, field_end) = match field {
        Some((start, end)) => (span.start + start, span.start + end),
        None => {
            // No dependencies field yet: insert one above the closing marker.
            let close = span.start + closing_marker_offset(block);
            (close, close)
        }
    };

    let mut out = String::with_capacity(source.len() + rendered.len());
    out.push_str(&source[..field_start]);
    out.push_str(&rendered);
    out.push_str(&source[field_end..]);
    out
}

/// Offset of the closing marker line within the block text.
fn closing_marker_offset(block: &str) -> usize {
    let mut offset = 0;
    let mut last = 0;
    for raw in block.split_inclusive('\n') {
        last = offset;
        offset += raw.len();
    }
    last
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deps(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn test_synthesize_block() {
        let source = "import httpx\n";
        let merged = merge_metadata(source, &deps(&["httpx"]), ">=3.12");
        assert_eq!(
            merged,
            "# /// script\n\
             # requires-python = \">=3.12\"\n\
             # dependencies = [\n\
             #   \"httpx\",\n\
             # ]\n\
             # ///\n\
             \n\
             import httpx\n"
        );
    }

    #[test]
    fn test_shebang_stays_first() {
        let source = "#!/usr/bin/env python3\nimport httpx\n";
        let merged = merge_metadata(source, &deps(&["httpx"]), ">=3.12");
        assert!(merged.starts_with("#!/usr/bin/env python3\n# /// script\n"));
        assert!(merged.ends_with("# ///\n\nimport httpx\n"));
    }

    #[test]
    fn test_shebang_only_file() {
        let source = "#!/usr/bin/env python3";
        let merged = merge_metadata(source, &deps(&[]), ">=3.12");
        assert!(merged.starts_with("#!/usr/bin/env python3\n# /// script\n"));
        assert!(merged.ends_with("# ///\n"));
    }

    #[test]
    fn test_empty_file_gets_block_only() {
        let merged = merge_metadata("", &deps(&[]), ">=3.12");
        assert_eq!(
            merged,
            "# /// script\n\
             # requires-python = \">=3.12\"\n\
             # dependencies = [\n\
             # ]\n\
             # ///\n"
        );
    }

    #[test]
    fn test_empty_set_keeps_field_present() {
        let merged = merge_metadata("print('x')\n", &deps(&[]), ">=3.11");
        assert!(merged.contains("# dependencies = [\n# ]\n"));
        assert!(merged.contains("# requires-python = \">=3.11\"\n"));
    }

    #[test]
    fn test_replace_existing_dependencies() {
        let source = "\
# /// script
# requires-python = \">=3.9\"
# dependencies = [
#   \"requests\",
# ]
# ///

import httpx
";
        let merged = merge_metadata(source, &deps(&["httpx"]), ">=3.12");
        assert!(merged.contains("#   \"httpx\",\n"));
        assert!(!merged.contains("requests"));
        // The existing specifier wins over the default.
        assert!(merged.contains("# requires-python = \">=3.9\"\n"));
    }

    #[test]
    fn test_unrelated_fields_survive_byte_for_byte() {
        let source = "\
# /// script
# requires-python = \">=3.9\"
# dependencies = [
#   \"old\",
# ]
#
# [tool.uv]
# exclude-newer = \"2024-01-01T00:00:00Z\"
# ///
import httpx
";
        let merged = merge_metadata(source, &deps(&["httpx", "rich"]), ">=3.12");
        assert!(merged.contains("# requires-python = \">=3.9\"\n"));
        assert!(merged.contains("# [tool.uv]\n# exclude-newer = \"2024-01-01T00:00:00Z\"\n"));
        assert!(merged.contains("#   \"httpx\",\n#   \"rich\",\n"));
        assert!(!merged.contains("old"));
        assert!(merged.ends_with("# ///\nimport httpx\n"));
    }

    #[test]
    fn test_idempotent() {
        let sources = [
            "import httpx\n",
            "#!/usr/bin/env python3\nimport httpx\nprint(httpx)\n",
            "# /// script\n# dependencies = [\n#   \"x\",\n# ]\n# ///\nimport os\n",
            "",
        ];
        for source in sources {
            let once = merge_metadata(source, &deps(&["httpx", "rich"]), ">=3.12");
            let twice = merge_metadata(&once, &deps(&["httpx", "rich"]), ">=3.12");
            assert_eq!(once, twice, "double merge should be a no-op for {source:?}");
        }
    }

    #[test]
    fn test_inline_empty_list_is_canonicalized() {
        let source = "\
# /// script
# requires-python = \">=3.10\"
# dependencies = []
# ///
import httpx
";
        let merged = merge_metadata(source, &deps(&["httpx"]), ">=3.12");
        assert!(merged.contains("# dependencies = [\n#   \"httpx\",\n# ]\n"));
        assert!(!merged.contains("# dependencies = []"));
        assert!(merged.contains("# requires-python = \">=3.10\"\n"));
    }

    #[test]
    fn test_block_without_dependencies_field_gains_one() {
        let source = "\
# /// script
# requires-python = \">=3.10\"
# ///
import httpx
";
        let merged = merge_metadata(source, &deps(&["httpx"]), ">=3.12");
        assert_eq!(
            merged,
            "\
# /// script
# requires-python = \">=3.10\"
# dependencies = [
#   \"httpx\",
# ]
# ///
import httpx
"
        );
    }

    #[test]
    fn test_unterminated_block_is_treated_as_absent() {
        let source = "# /// script\n# dependencies = [\nimport os\n";
        let merged = merge_metadata(source, &deps(&["httpx"]), ">=3.12");
        // A fresh block lands on top; the malformed text is left alone.
        assert!(merged.starts_with("# /// script\n# requires-python"));
        assert!(merged.ends_with("# /// script\n# dependencies = [\nimport os\n"));
    }

    #[test]
    fn test_block_after_executable_code_is_not_recognized() {
        let source = "import os\n# /// script\n# dependencies = [\n# ]\n# ///\n";
        let merged = merge_metadata(source, &deps(&["httpx"]), ">=3.12");
        assert!(merged.starts_with("# /// script\n# requires-python"));
        // The stale block below the code is untouched.
        assert!(merged.contains("import os\n# /// script\n# dependencies = [\n# ]\n# ///\n"));
    }

    #[test]
    fn test_block_below_leading_comments_is_found() {
        let source = "\
# my script
# (c) someone

# /// script
# dependencies = [
#   \"old\",
# ]
# ///
import httpx
";
        let merged = merge_metadata(source, &deps(&["httpx"]), ">=3.12");
        assert!(merged.starts_with("# my script\n# (c) someone\n\n# /// script\n"));
        assert!(merged.contains("#   \"httpx\",\n"));
        assert!(!merged.contains("old"));
    }

    #[test]
    fn test_only_first_block_is_merged() {
        let source = "\
# /// script
# dependencies = [
# ]
# ///
# /// script
# dependencies = [
#   \"stale\",
# ]
# ///
";
        let merged = merge_metadata(source, &deps(&["httpx"]), ">=3.12");
        let first_end = merged.find("# ///\n").map(|i| i + 6).unwrap_or(0);
        assert!(merged[..first_end].contains("# dependencies = [\n"));
        assert!(merged.contains("#   \"httpx\",\n"));
        assert!(merged[first_end..].contains("stale"), "second block untouched");
    }

    #[test]
    fn test_unclosed_dependency_list_is_healed() {
        let source = "\
# /// script
# dependencies = [
# ///
import httpx
";
        let merged = merge_metadata(source, &deps(&["httpx"]), ">=3.12");
        assert_eq!(
            merged,
            "\
# /// script
# dependencies = [
#   \"httpx\",
# ]
# ///
import httpx
"
        );
        let twice = merge_metadata(&merged, &deps(&["httpx"]), ">=3.12");
        assert_eq!(merged, twice);
    }

    #[test]
    fn test_crlf_outside_field_survives() {
        let source = "# /// script\r\n# requires-python = \">=3.9\"\r\n# dependencies = [\r\n#   \"old\",\r\n# ]\r\n# ///\r\nimport httpx\r\n";
        let merged = merge_metadata(source, &deps(&["httpx"]), ">=3.12");
        assert!(merged.contains("# requires-python = \">=3.9\"\r\n"));
        assert!(merged.contains("import httpx\r\n"));
        assert!(merged.contains("# dependencies = [\n#   \"httpx\",\n# ]\n"));
    }
}
