//! Flattening of parent-linked task lists into display order.
//!
//! Shared by the terminal and web front ends: both hand the already
//! filtered, already ordered result of a listing to [`flatten_tree`] and
//! render the returned sequence top to bottom. Pure function, no storage
//! access.

use std::collections::{HashMap, HashSet};

use crate::error::{StoreError, StoreResult};
use crate::types::Task;

/// A depth-first, depth-annotated display order over a task forest.
#[derive(Debug, Clone, Default)]
pub struct FlatTree {
    /// Tasks in display order. Collapsed subtrees are omitted entirely.
    pub visible: Vec<Task>,
    /// Depth per visible task id; roots are 0.
    pub depth: HashMap<i64, usize>,
    /// True for every task id that has at least one child within the
    /// input set, whether or not the subtree is currently visible.
    pub has_children: HashMap<i64, bool>,
}

/// Flatten a task list into a pre-order walk of its parent/child forest.
///
/// A task's parent link is honored only when the parent itself is in the
/// input; otherwise the task is a root for this view, which lets a child
/// show up as a top-level row in a filtered list that excludes its
/// parent. Sibling order is input order. Tasks in `collapsed` emit
/// themselves but none of their descendants.
///
/// Fails with [`StoreError::Structural`] when the input contains a
/// duplicate id or parent links that loop, instead of dropping rows.
pub fn flatten_tree(tasks: &[Task], collapsed: &HashSet<i64>) -> StoreResult<FlatTree> {
    if tasks.is_empty() {
        return Ok(FlatTree::default());
    }

    let mut order: HashMap<i64, usize> = HashMap::with_capacity(tasks.len());
    for (index, task) in tasks.iter().enumerate() {
        if order.insert(task.id, index).is_some() {
            return Err(StoreError::structural(format!(
                "duplicate task id {} in flatten input",
                task.id
            )));
        }
    }

    // Group input indices by effective parent, in input order. None is
    // the root group.
    let mut children: HashMap<Option<i64>, Vec<usize>> = HashMap::new();
    for (index, task) in tasks.iter().enumerate() {
        let parent = task.parent_task_id.filter(|p| order.contains_key(p));
        children.entry(parent).or_default().push(index);
    }

    let mut has_children: HashMap<i64, bool> = HashMap::new();
    for (parent, group) in &children {
        if let Some(id) = parent {
            if !group.is_empty() {
                has_children.insert(*id, true);
            }
        }
    }

    let mut flat = FlatTree {
        visible: Vec::with_capacity(tasks.len()),
        depth: HashMap::with_capacity(tasks.len()),
        has_children,
    };

    // The walk visits collapsed subtrees without emitting them, so that
    // every well-formed input is fully covered and anything left
    // unvisited can only be a cycle.
    let mut visited: HashSet<i64> = HashSet::with_capacity(tasks.len());
    walk(
        None, 0, true, tasks, &children, collapsed, &mut visited, &mut flat,
    )?;

    if visited.len() != tasks.len() {
        return Err(StoreError::structural(format!(
            "parent links form a cycle: {} task(s) unreachable from any root",
            tasks.len() - visited.len()
        )));
    }

    Ok(flat)
}

#[allow(clippy::too_many_arguments)]
fn walk(
    parent: Option<i64>,
    depth: usize,
    emit: bool,
    tasks: &[Task],
    children: &HashMap<Option<i64>, Vec<usize>>,
    collapsed: &HashSet<i64>,
    visited: &mut HashSet<i64>,
    flat: &mut FlatTree,
) -> StoreResult<()> {
    let Some(group) = children.get(&parent) else {
        return Ok(());
    };

    for &index in group {
        let task = &tasks[index];
        if !visited.insert(task.id) {
            return Err(StoreError::structural(format!(
                "task {} revisited while flattening",
                task.id
            )));
        }

        if emit {
            flat.visible.push(task.clone());
            flat.depth.insert(task.id, depth);
        }

        let emit_subtree = emit && !collapsed.contains(&task.id);
        walk(
            Some(task.id),
            depth + 1,
            emit_subtree,
            tasks,
            children,
            collapsed,
            visited,
            flat,
        )?;
    }

    Ok(())
}
