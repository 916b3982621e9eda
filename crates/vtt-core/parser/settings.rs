//! Cue-settings and region-settings grammars.
//!
//! Both grammars are space-separated `name:value` tokens. Malformed tokens
//! are recorded as issues and skipped; they never fail the cue or region as
//! a whole. The one structural rule enforced here is exclusivity: explicit
//! positioning on a cue clears its region association.

use super::errors::{IssueCategory, IssueSeverity, ParseError, ParseIssue};
use super::timestamp::{parse_float_percentage, parse_int_percentage};
use crate::cue::{Anchor, CueSettings, LinePosition, Region, ScrollMode, TextAlign, WritingDirection};

/// Parse the settings suffix of a cue timing line.
///
/// Unknown names and unparsable values produce [`IssueCategory::Settings`]
/// issues; everything that parses is applied.
pub(crate) fn parse_cue_settings(
    input: &str,
    line: u32,
    issues: &mut Vec<ParseIssue>,
) -> CueSettings {
    let mut settings = CueSettings::default();

    for token in input.split_whitespace() {
        let Some((name, value)) = token.split_once(':') else {
            issues.push(ParseIssue {
                severity: IssueSeverity::Warning,
                category: IssueCategory::Settings,
                message: format!("cue setting without value: {token:?}"),
                line,
            });
            continue;
        };

        if let Err(error) = apply_cue_setting(&mut settings, name, value) {
            issues.push(ParseIssue::from_error(
                &error,
                IssueCategory::Settings,
                line,
            ));
        }
    }

    // Explicit positioning and region layout are mutually exclusive
    if settings.has_explicit_positioning() {
        settings.region_id = None;
    }

    settings
}

fn apply_cue_setting(
    settings: &mut CueSettings,
    name: &str,
    value: &str,
) -> Result<(), ParseError> {
    let invalid = || ParseError::InvalidCueSetting {
        name: name.to_string(),
        value: value.to_string(),
    };

    match name {
        "region" => settings.region_id = Some(value.to_string()),
        "vertical" => {
            settings.direction = match value {
                "rl" => WritingDirection::VerticalRl,
                "lr" => WritingDirection::VerticalLr,
                _ => return Err(invalid()),
            };
        }
        "line" => {
            settings.line = Some(if value.ends_with('%') {
                LinePosition::Percentage(parse_float_percentage(value)?)
            } else {
                LinePosition::Number(value.parse().map_err(|_| invalid())?)
            });
        }
        "position" => settings.position = Some(parse_int_percentage(value)? as f32),
        "size" => settings.size = Some(parse_int_percentage(value)? as f32),
        "align" => {
            settings.align = Some(match value {
                "start" => TextAlign::Start,
                "middle" => TextAlign::Middle,
                "end" => TextAlign::End,
                "left" => TextAlign::Left,
                "right" => TextAlign::Right,
                _ => return Err(invalid()),
            });
        }
        _ => return Err(invalid()),
    }
    Ok(())
}

/// Parse the value of a `Region:` header line.
///
/// Returns `None` when no usable region results (a region with no id cannot
/// be referenced by any cue).
pub(crate) fn parse_region_line(
    input: &str,
    line: u32,
    issues: &mut Vec<ParseIssue>,
) -> Option<Region> {
    let mut region = Region::default();

    for token in input.split_whitespace() {
        let Some((name, value)) = token.split_once(':') else {
            issues.push(ParseIssue {
                severity: IssueSeverity::Warning,
                category: IssueCategory::Region,
                message: format!("region setting without value: {token:?}"),
                line,
            });
            continue;
        };

        if let Err(error) = apply_region_setting(&mut region, name, value) {
            issues.push(ParseIssue::from_error(&error, IssueCategory::Region, line));
        }
    }

    if region.id.is_empty() {
        issues.push(ParseIssue {
            severity: IssueSeverity::Warning,
            category: IssueCategory::Region,
            message: "region declaration without id ignored".to_string(),
            line,
        });
        return None;
    }
    Some(region)
}

fn apply_region_setting(region: &mut Region, name: &str, value: &str) -> Result<(), ParseError> {
    let invalid = || ParseError::InvalidRegionSetting {
        name: name.to_string(),
        value: value.to_string(),
    };

    match name {
        "id" => region.id = value.to_string(),
        "width" => region.width = parse_float_percentage(value)?,
        "lines" => region.lines = value.parse().map_err(|_| invalid())?,
        "regionanchor" => region.region_anchor = parse_anchor(value)?,
        "viewportanchor" => region.viewport_anchor = parse_anchor(value)?,
        "scroll" => {
            region.scroll = match value {
                "up" => ScrollMode::Up,
                _ => return Err(invalid()),
            };
        }
        _ => return Err(invalid()),
    }
    Ok(())
}

/// Parse an `x%,y%` anchor-point pair
fn parse_anchor(value: &str) -> Result<Anchor, ParseError> {
    let (x, y) = value.split_once(',').ok_or_else(|| ParseError::MalformedAnchor {
        value: value.to_string(),
    })?;
    Ok(Anchor {
        x: parse_float_percentage(x)?,
        y: parse_float_percentage(y)?,
    })
}
