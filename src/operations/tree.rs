//! Nested file tree of a branch

use crate::git::ops::TreeEntry;
use crate::operations::RepoContext;
use anyhow::Result;
use serde::Serialize;
use std::collections::BTreeMap;

/// Kind of a [`TreeNode`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Folder,
    File,
}

/// One folder or file in the tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeNode {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<TreeNode>>,
}

impl TreeNode {
    fn folder(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            kind: NodeKind::Folder,
            mode: None,
            hash: None,
            children: Some(Vec::new()),
        }
    }

    fn file(name: &str, entry: &TreeEntry) -> Self {
        Self {
            name: name.to_owned(),
            kind: NodeKind::File,
            mode: Some(entry.mode.clone()),
            hash: Some(entry.hash.clone()),
            children: None,
        }
    }

    /// Child folder `name`, created on first use
    fn folder_mut(&mut self, name: &str) -> &mut Self {
        let children = self.children.get_or_insert_with(Vec::new);
        let index = match children
            .iter()
            .position(|child| child.kind == NodeKind::Folder && child.name == name)
        {
            Some(index) => index,
            None => {
                children.push(Self::folder(name));
                children.len() - 1
            }
        };
        &mut children[index]
    }
}

/// Fold flat `ls-tree` entries into a tree rooted at a folder named `root`
///
/// Entries keep the order git listed them in.
#[must_use]
pub fn build_tree(entries: &[TreeEntry]) -> TreeNode {
    let mut root = TreeNode::folder("root");

    for entry in entries {
        let parts: Vec<&str> = entry.path.split('/').filter(|p| !p.is_empty()).collect();
        let Some((file_name, folders)) = parts.split_last() else {
            continue;
        };

        let mut current = &mut root;
        for folder in folders {
            current = current.folder_mut(folder);
        }
        current
            .children
            .get_or_insert_with(Vec::new)
            .push(TreeNode::file(file_name, entry));
    }

    root
}

/// Flat view of one [`TreeNode`], without its children
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexEntry {
    #[serde(rename = "type")]
    pub kind: NodeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
}

/// Nested tree plus a lookup of every folder and file by its full path
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileTree {
    pub tree: TreeNode,
    pub index: BTreeMap<String, IndexEntry>,
}

/// Index every node below `root` by its slash-separated path
#[must_use]
pub fn build_index(root: &TreeNode) -> BTreeMap<String, IndexEntry> {
    fn walk(node: &TreeNode, prefix: &str, index: &mut BTreeMap<String, IndexEntry>) {
        for child in node.children.iter().flatten() {
            let path = if prefix.is_empty() {
                child.name.clone()
            } else {
                format!("{prefix}/{}", child.name)
            };
            index.insert(
                path.clone(),
                IndexEntry {
                    kind: child.kind,
                    mode: child.mode.clone(),
                    hash: child.hash.clone(),
                },
            );
            walk(child, &path, index);
        }
    }

    let mut index = BTreeMap::new();
    walk(root, "", &mut index);
    index
}

/// File tree of `branch`, or of the configured default branch
///
/// # Errors
///
/// Returns `GitFrontError::EngineCommand` if `git ls-tree` fails or prints
/// something unexpected.
pub fn file_tree(ctx: &RepoContext<'_>, branch: Option<&str>) -> Result<FileTree> {
    let branch = branch.unwrap_or(ctx.settings().default_branch.as_str());
    let entries = ctx.ops().ls_tree(branch)?;
    let tree = build_tree(&entries);
    let index = build_index(&tree);
    Ok(FileTree { tree, index })
}
