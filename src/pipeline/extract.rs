//! Block-to-text flattening.
//!
//! Turns an entry body into markdown-like text, one paragraph per block:
//!
//! | kind                 | line            |
//! |----------------------|-----------------|
//! | `bulleted_list_item` | `- text`        |
//! | `numbered_list_item` | `1. text`       |
//! | `heading_N`          | `#`×N `text`    |
//! | `code`               | fenced `text`   |
//! | anything else        | `text`          |

use crate::models::{Block, BlockKind};

const BLOCK_SEPARATOR: &str = "\n\n";

/// Flatten blocks into text, joined by blank lines in input order.
pub fn extract_text(blocks: &[Block]) -> String {
    blocks
        .iter()
        .map(render_block)
        .collect::<Vec<_>>()
        .join(BLOCK_SEPARATOR)
}

/// Render a single block. Blocks without inline text render as an empty string.
pub fn render_block(block: &Block) -> String {
    let text = block.plain_text();
    if text.is_empty() {
        return String::new();
    }

    match block.kind {
        BlockKind::BulletedListItem => format!("- {text}"),
        // Markdown renderers renumber ordered lists, so every item carries `1.`
        BlockKind::NumberedListItem => format!("1. {text}"),
        BlockKind::Heading1 => format!("# {text}"),
        BlockKind::Heading2 => format!("## {text}"),
        BlockKind::Heading3 => format!("### {text}"),
        BlockKind::Code => format!("```\n{text}\n```"),
        BlockKind::Paragraph | BlockKind::Other => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bulleted_item() {
        let blocks = [Block::new(BlockKind::BulletedListItem, ["buy milk"])];
        assert_eq!(extract_text(&blocks), "- buy milk");
    }

    #[test]
    fn test_heading_levels() {
        assert_eq!(
            render_block(&Block::new(BlockKind::Heading1, ["Top"])),
            "# Top"
        );
        assert_eq!(
            render_block(&Block::new(BlockKind::Heading2, ["Intro"])),
            "## Intro"
        );
        assert_eq!(
            render_block(&Block::new(BlockKind::Heading3, ["Detail"])),
            "### Detail"
        );
    }

    #[test]
    fn test_numbered_items_keep_literal_prefix() {
        let blocks = [
            Block::new(BlockKind::NumberedListItem, ["first"]),
            Block::new(BlockKind::NumberedListItem, ["second"]),
        ];
        let text = extract_text(&blocks);
        let lines: Vec<&str> = text.split(BLOCK_SEPARATOR).collect();

        assert_eq!(lines, ["1. first", "1. second"]);
        assert!(!text.contains("2."));
    }

    #[test]
    fn test_code_is_fenced() {
        let block = Block::new(BlockKind::Code, ["let x = 1;"]);
        assert_eq!(render_block(&block), "```\nlet x = 1;\n```");
    }

    #[test]
    fn test_unrecognized_without_text_is_empty() {
        let blocks = [Block::new(BlockKind::Other, Vec::<String>::new())];
        assert_eq!(extract_text(&blocks), "");
    }

    #[test]
    fn test_runs_concatenate_and_blocks_join_in_order() {
        let blocks = [
            Block::new(BlockKind::Paragraph, ["Seme ", "then ", "strike"]),
            Block::new(BlockKind::Other, ["callout text"]),
            Block::new(BlockKind::BulletedListItem, ["kote"]),
        ];
        assert_eq!(
            extract_text(&blocks),
            "Seme then strike\n\ncallout text\n\n- kote"
        );
    }

    #[test]
    fn test_empty_body() {
        assert_eq!(extract_text(&[]), "");
    }
}
