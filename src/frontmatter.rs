use crate::error::{Error, Result};
use crate::position::Position;

/// Result of splitting a leading YAML frontmatter block from a template
/// body.
#[derive(Debug, Clone)]
pub struct Frontmatter {
    pub has_frontmatter: bool,
    pub frontmatter_yaml: String,
    pub template_body: String,
    pub frontmatter_position: Position,
}

const LEGACY_CONFIG_TAG: &str = "{~prompty.config~}";

/// Split an optional `---`-fenced YAML header from `source`.
pub fn split(source: &str) -> Result<Frontmatter> {
    let bytes = source.as_bytes();
    let mut idx = 0usize;

    if bytes.starts_with(&[0xEF, 0xBB, 0xBF]) {
        idx += 3;
    }
    let body_start_no_fm = idx;
    while idx < bytes.len() && (bytes[idx] == b' ' || bytes[idx] == b'\t') {
        idx += 1;
    }

    if !bytes[idx..].starts_with(b"---") {
        return check_legacy(source, body_start_no_fm);
    }
    let after_fence = idx + 3;
    let after_fence = match bytes.get(after_fence..) {
        Some(rest) if rest.starts_with(b"\r\n") => after_fence + 2,
        Some(rest) if rest.starts_with(b"\n") => after_fence + 1,
        Some(rest) if rest.is_empty() => after_fence,
        _ => return check_legacy(source, body_start_no_fm),
    };

    let mut scan = after_fence;
    loop {
        if scan >= bytes.len() {
            return Err(Error::FrontmatterUnclosed(Position::from_offset(
                bytes,
                after_fence,
            )));
        }
        let line_end = bytes[scan..]
            .iter()
            .position(|b| *b == b'\n')
            .map(|p| scan + p)
            .unwrap_or(bytes.len());
        let mut line = &source[scan..line_end];
        if let Some(stripped) = line.strip_suffix('\r') {
            line = stripped;
        }
        if line == "---" {
            let yaml_end = scan;
            // Only the single line terminator before the closer is trimmed;
            // a blank line at the end of the YAML block is content.
            let mut yaml = &source[after_fence..yaml_end];
            if let Some(stripped) = yaml.strip_suffix('\n') {
                yaml = stripped.strip_suffix('\r').unwrap_or(stripped);
            }
            let body_start = (line_end + 1).min(bytes.len());
            let body = if body_start <= source.len() {
                &source[body_start..]
            } else {
                ""
            };
            return Ok(Frontmatter {
                has_frontmatter: true,
                frontmatter_yaml: yaml.to_string(),
                template_body: body.to_string(),
                frontmatter_position: Position::from_offset(bytes, body_start_no_fm),
            });
        }
        if line_end >= bytes.len() {
            return Err(Error::FrontmatterUnclosed(Position::from_offset(
                bytes,
                after_fence,
            )));
        }
        scan = line_end + 1;
    }
}

fn check_legacy(source: &str, from: usize) -> Result<Frontmatter> {
    let trimmed = source[from..].trim_start_matches(|c: char| c == ' ' || c == '\t');
    if trimmed.starts_with(LEGACY_CONFIG_TAG) {
        return Err(Error::LegacyJsonConfigDetected(Position::from_offset(
            source.as_bytes(),
            from,
        )));
    }
    Ok(Frontmatter {
        has_frontmatter: false,
        frontmatter_yaml: String::new(),
        template_body: source.to_string(),
        frontmatter_position: Position::new(0, 1, 1),
    })
}
