//! Body content blocks.

use serde::{Deserialize, Serialize};

/// Kind tag of a content block.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    Paragraph,
    BulletedListItem,
    NumberedListItem,
    #[serde(rename = "heading_1")]
    Heading1,
    #[serde(rename = "heading_2")]
    Heading2,
    #[serde(rename = "heading_3")]
    Heading3,
    Code,
    #[serde(other)]
    Other,
}

impl BlockKind {
    /// Map the store's block `type` tag onto a kind.
    pub fn from_type(tag: &str) -> Self {
        match tag {
            "paragraph" => Self::Paragraph,
            "bulleted_list_item" => Self::BulletedListItem,
            "numbered_list_item" => Self::NumberedListItem,
            "heading_1" => Self::Heading1,
            "heading_2" => Self::Heading2,
            "heading_3" => Self::Heading3,
            "code" => Self::Code,
            _ => Self::Other,
        }
    }
}

/// One unit of an entry's body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Block {
    pub kind: BlockKind,

    /// Inline text runs, in order. Empty for kinds without inline text.
    #[serde(default)]
    pub text: Vec<String>,
}

impl Block {
    pub fn new<I, S>(kind: BlockKind, runs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kind,
            text: runs.into_iter().map(Into::into).collect(),
        }
    }

    /// Concatenated inline text.
    pub fn plain_text(&self) -> String {
        self.text.concat()
    }
}
