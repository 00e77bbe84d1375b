//! Logging and debugging facilities.
//!
//! Trellis uses the `tracing` crate for instrumentation. Install a
//! subscriber in the application to see logs:
//!
//! ```ignore
//! tracing_subscriber::fmt::init();
//! ```
//!
//! [`format_item_tree`] renders an item tree for debug output.

use std::fmt::Write as FmtWrite;

use crate::model::{ItemId, Model};
use crate::role::Role;

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Model mutation target.
    pub const MODEL: &str = "trellis_model::model";
    /// Change mapper target.
    pub const MAPPER: &str = "trellis_model::mapper";
    /// Signal utility target.
    pub const SIGNAL: &str = "trellis_model::signal";
    /// Serialization target.
    pub const SERIALIZATION: &str = "trellis_model::serialization";
}

/// Style options for item tree visualization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TreeStyle {
    /// ASCII characters for tree branches.
    Ascii,
    /// Unicode box-drawing characters.
    #[default]
    Unicode,
}

/// Configuration for item tree debug output.
#[derive(Debug, Clone)]
pub struct TreeFormatOptions {
    /// The style of tree visualization.
    pub style: TreeStyle,
    /// Whether to show the `Display` role next to the model type.
    pub show_display: bool,
    /// Whether to show tag names for child groups.
    pub show_tags: bool,
    /// Maximum depth to traverse (None for unlimited).
    pub max_depth: Option<usize>,
}

impl Default for TreeFormatOptions {
    fn default() -> Self {
        Self {
            style: TreeStyle::default(),
            show_display: true,
            show_tags: true,
            max_depth: None,
        }
    }
}

/// Render the subtree rooted at `item` as an indented tree.
///
/// Intended for debug logs and test failure output. Invalid ids render
/// as a single `<invalid>` line rather than failing.
pub fn format_item_tree(model: &Model, item: ItemId, options: &TreeFormatOptions) -> String {
    let mut out = String::new();
    format_recursive(model, item, options, 0, &mut out);
    out
}

fn format_recursive(
    model: &Model,
    item: ItemId,
    options: &TreeFormatOptions,
    depth: usize,
    out: &mut String,
) {
    if options.max_depth.is_some_and(|max| depth > max) {
        return;
    }

    let branch = match options.style {
        TreeStyle::Ascii => "|- ",
        TreeStyle::Unicode => "├─ ",
    };
    for _ in 0..depth {
        out.push_str("  ");
    }
    if depth > 0 {
        out.push_str(branch);
    }

    let Ok(model_type) = model.model_type(item) else {
        out.push_str("<invalid>\n");
        return;
    };
    out.push_str(&model_type);

    if options.show_display {
        if let Ok(Some(display)) = model.data(item, Role::Display) {
            if let Some(text) = display.as_str() {
                let _ = write!(out, " \"{text}\"");
            }
        }
    }
    out.push('\n');

    for tag in model.tag_names(item).unwrap_or_default() {
        let children = model.children(item, &tag).unwrap_or_default();
        if children.is_empty() {
            continue;
        }
        if options.show_tags {
            for _ in 0..=depth {
                out.push_str("  ");
            }
            let _ = writeln!(out, "[{tag}]");
        }
        for child in children {
            format_recursive(model, child, options, depth + 1, out);
        }
    }
}
