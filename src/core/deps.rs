//! Dependency graph checks over a project's cards.
//!
//! Edges point from a card to the cards it depends on. The graph must stay
//! acyclic; every edge is checked here before it is committed.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use super::card::Card;
use super::domain::CardId;
use super::error::InvalidDependency;

/// Would adding `from -> to` close a cycle?
///
/// True when `from == to`, or when `to` already depends on `from` directly or
/// transitively. Iterative DFS from `to`, O(V+E).
pub fn would_create_cycle(cards: &[Card], from: &CardId, to: &CardId) -> bool {
    if from == to {
        return true;
    }
    let index: HashMap<&CardId, &Card> = cards.iter().map(|card| (&card.id, card)).collect();
    reaches(to, from, |id| {
        index
            .get(id)
            .map(|card| card.depends_on.iter().collect::<Vec<_>>())
            .unwrap_or_default()
    })
}

/// Would making `parent` the parent of `child` close a loop in the hierarchy?
pub fn would_create_parent_cycle(cards: &[Card], child: &CardId, parent: &CardId) -> bool {
    if child == parent {
        return true;
    }
    let index: HashMap<&CardId, &Card> = cards.iter().map(|card| (&card.id, card)).collect();
    reaches(parent, child, |id| {
        index
            .get(id)
            .and_then(|card| card.parent.as_ref())
            .into_iter()
            .collect::<Vec<_>>()
    })
}

/// Result-returning form of [`would_create_cycle`].
pub fn check_no_cycle(cards: &[Card], from: &CardId, to: &CardId) -> Result<(), InvalidDependency> {
    if from == to {
        return Err(InvalidDependency {
            reason: format!("card {from} cannot depend on itself"),
        });
    }
    if would_create_cycle(cards, from, to) {
        return Err(InvalidDependency {
            reason: format!(
                "circular dependency: {to} already depends on {from} (directly or transitively)"
            ),
        });
    }
    Ok(())
}

fn reaches<'a, F, I>(start: &'a CardId, target: &CardId, mut next: F) -> bool
where
    F: FnMut(&'a CardId) -> I,
    I: IntoIterator<Item = &'a CardId>,
{
    let mut visited: HashSet<&CardId> = HashSet::new();
    let mut stack = vec![start];

    while let Some(current) = stack.pop() {
        if current == target {
            return true;
        }
        if !visited.insert(current) {
            continue;
        }
        for dep in next(current) {
            if !visited.contains(dep) {
                stack.push(dep);
            }
        }
    }
    false
}

/// Find dependency cycles already present in a set of cards.
///
/// Mutations never create cycles, so this only reports anything for
/// documents assembled elsewhere. Each cycle starts and ends at the same id,
/// rotated so the smallest id comes first.
pub fn dependency_cycles(cards: &[Card]) -> Vec<Vec<CardId>> {
    let adjacency: BTreeMap<&CardId, &BTreeSet<CardId>> = cards
        .iter()
        .map(|card| (&card.id, &card.depends_on))
        .collect();

    #[derive(Clone, Copy, PartialEq, Eq)]
    enum Mark {
        Active,
        Done,
    }

    fn normalize(cycle: &[CardId]) -> Vec<CardId> {
        // cycle is [a, b, ..., a]; rotate the open path, then close it again
        let open = &cycle[..cycle.len() - 1];
        let start = open
            .iter()
            .enumerate()
            .min_by(|a, b| a.1.cmp(b.1))
            .map(|(pos, _)| pos)
            .unwrap_or(0);
        let mut out: Vec<CardId> = open[start..].iter().chain(&open[..start]).cloned().collect();
        if let Some(first) = out.first().cloned() {
            out.push(first);
        }
        out
    }

    fn dfs<'a>(
        node: &'a CardId,
        adjacency: &BTreeMap<&'a CardId, &'a BTreeSet<CardId>>,
        marks: &mut HashMap<&'a CardId, Mark>,
        stack: &mut Vec<&'a CardId>,
        seen: &mut HashSet<Vec<CardId>>,
        cycles: &mut Vec<Vec<CardId>>,
    ) {
        marks.insert(node, Mark::Active);
        stack.push(node);
        if let Some(deps) = adjacency.get(node).copied() {
            for target in deps {
                if !adjacency.contains_key(target) {
                    continue;
                }
                match marks.get(target).copied() {
                    Some(Mark::Active) => {
                        if let Some(pos) = stack.iter().position(|id| *id == target) {
                            let mut cycle: Vec<CardId> =
                                stack[pos..].iter().map(|id| (*id).clone()).collect();
                            cycle.push(target.clone());
                            let cycle = normalize(&cycle);
                            if seen.insert(cycle.clone()) {
                                cycles.push(cycle);
                            }
                        }
                    }
                    Some(Mark::Done) => {}
                    None => dfs(target, adjacency, marks, stack, seen, cycles),
                }
            }
        }
        stack.pop();
        marks.insert(node, Mark::Done);
    }

    let mut marks = HashMap::new();
    let mut stack = Vec::new();
    let mut seen = HashSet::new();
    let mut cycles = Vec::new();
    for node in adjacency.keys().copied() {
        if !marks.contains_key(node) {
            dfs(node, &adjacency, &mut marks, &mut stack, &mut seen, &mut cycles);
        }
    }
    cycles.sort();
    cycles
}
