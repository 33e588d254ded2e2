use std::collections::{BTreeMap, BTreeSet};

use itertools::Itertools;

use crate::relation::{OrderingError, RelationId, RelationOps, RelationOrderer, RelationValue};

/// The join-table writes needed to apply one relation mutation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinkPlan {
    /// Target ids whose link rows must be removed
    pub detach: Vec<RelationId>,
    /// (target id, order) pairs to insert or rewrite, orders dense from 1
    pub attach: Vec<(RelationId, f64)>,
}

impl LinkPlan {
    pub fn is_empty(&self) -> bool {
        self.detach.is_empty() && self.attach.is_empty()
    }
}

/// Diff a relation mutation value against the links already stored.
///
/// `None`, bare ids, id lists and the `set` key replace the stored links
/// wholesale; `connect` and `disconnect` adjust them incrementally and may be
/// combined with `set`, in which case they apply on top of it. `attach` holds
/// every link whose (id, order) pair differs from what is stored, so rows
/// shifted by a renumbering are rewritten along with the new ones.
pub fn plan_links(
    existing: &[(RelationId, f64)],
    value: &RelationValue,
    strict: bool,
) -> Result<LinkPlan, OrderingError> {
    let ops = match value {
        RelationValue::None => RelationOps {
            set: Some(Vec::new()),
            ..Default::default()
        },
        RelationValue::One(id) => RelationOps {
            set: Some(vec![id.clone()]),
            ..Default::default()
        },
        RelationValue::Many(ids) => RelationOps {
            set: Some(ids.clone()),
            ..Default::default()
        },
        RelationValue::Ops(ops) => ops.clone(),
    };

    let mut orderer = match &ops.set {
        Some(ids) => RelationOrderer::new(
            ids.iter()
                .unique()
                .cloned()
                .enumerate()
                .map(|(index, id)| (id, (index + 1) as f64)),
        ),
        None => RelationOrderer::new(existing.iter().cloned()),
    };
    if strict {
        orderer = orderer.strict();
    }
    for id in &ops.disconnect {
        orderer.disconnect(id);
    }
    for connect in &ops.connect {
        orderer.connect(connect)?;
    }
    let arranged = orderer.order_map();

    let stored: BTreeMap<&RelationId, f64> = existing.iter().map(|(id, order)| (id, *order)).collect();
    let kept: BTreeSet<&RelationId> = arranged.iter().map(|(id, _)| id).collect();
    Ok(LinkPlan {
        detach: existing
            .iter()
            .filter(|(id, _)| !kept.contains(id))
            .map(|(id, _)| id.clone())
            .collect(),
        attach: arranged
            .iter()
            .filter(|(id, order)| stored.get(id) != Some(order))
            .cloned()
            .collect(),
    })
}
