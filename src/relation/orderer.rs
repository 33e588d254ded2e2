use thiserror::Error;

use crate::relation::{Connect, Position, RelationId};

/// Error raised by [`RelationOrderer::connect`] in strict mode.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OrderingError {
    #[error("cannot connect relation {id}: anchor relation {anchor} is not connected")]
    MissingAnchor { id: RelationId, anchor: RelationId },
}

#[derive(Debug, Clone, PartialEq)]
struct Placed {
    id: RelationId,
    order: f64,
}

/// Arranges the links of one relation field.
///
/// Existing links keep their stored order values; connects are placed between
/// them at fractional positions, so a single pass over the mutation input
/// never renumbers rows it does not touch. [`RelationOrderer::order_map`]
/// flattens the fractions back to a dense 1-based sequence at the end.
///
/// Anchors must already be placed when a positioned connect arrives, either
/// as an existing link or by an earlier connect of the same batch. A missing
/// anchor appends at the back, or errors in strict mode.
#[derive(Debug, Clone)]
pub struct RelationOrderer {
    placed: Vec<Placed>,
    strict: bool,
}

impl RelationOrderer {
    /// Start from the links already stored, given as (id, order) pairs.
    pub fn new<I>(existing: I) -> Self
    where
        I: IntoIterator<Item = (RelationId, f64)>,
    {
        Self {
            placed: existing
                .into_iter()
                .map(|(id, order)| Placed { id, order })
                .collect(),
            strict: false,
        }
    }

    /// Error on missing anchors instead of appending at the back.
    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    /// Place one connect entry. Reconnecting an already placed id moves it.
    pub fn connect(&mut self, connect: &Connect) -> Result<(), OrderingError> {
        self.remove(&connect.id);
        let (index, order) = match &connect.position {
            Some(Position::Before(anchor)) => match self.find(anchor) {
                Some(index) => (index, self.placed[index].order - 0.5),
                None => self.missing_anchor(connect, anchor)?,
            },
            Some(Position::After(anchor)) => match self.find(anchor) {
                Some(index) => (index + 1, self.placed[index].order + 0.5),
                None => self.missing_anchor(connect, anchor)?,
            },
            Some(Position::Start) => (0, 0.5),
            Some(Position::End) | None => self.back(),
        };
        self.placed.insert(
            index,
            Placed {
                id: connect.id.clone(),
                order,
            },
        );
        Ok(())
    }

    /// Remove one link. Unknown ids are ignored.
    pub fn disconnect(&mut self, id: &RelationId) {
        self.remove(id);
    }

    /// The final arrangement with orders renumbered to 1..=n.
    ///
    /// Ties between fractional orders keep their placement order.
    pub fn order_map(&self) -> Vec<(RelationId, f64)> {
        let mut placed: Vec<&Placed> = self.placed.iter().collect();
        placed.sort_by(|a, b| a.order.total_cmp(&b.order));
        placed
            .into_iter()
            .enumerate()
            .map(|(index, entry)| (entry.id.clone(), (index + 1) as f64))
            .collect()
    }

    fn find(&self, id: &RelationId) -> Option<usize> {
        self.placed.iter().position(|entry| &entry.id == id)
    }

    fn remove(&mut self, id: &RelationId) {
        if let Some(index) = self.find(id) {
            self.placed.remove(index);
        }
    }

    fn back(&self) -> (usize, f64) {
        let max = self
            .placed
            .iter()
            .map(|entry| entry.order)
            .fold(0.0_f64, f64::max);
        (self.placed.len(), max + 0.5)
    }

    fn missing_anchor(
        &self,
        connect: &Connect,
        anchor: &RelationId,
    ) -> Result<(usize, f64), OrderingError> {
        if self.strict {
            return Err(OrderingError::MissingAnchor {
                id: connect.id.clone(),
                anchor: anchor.clone(),
            });
        }
        Ok(self.back())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn id(n: i64) -> RelationId {
        RelationId::Int(n)
    }

    fn existing(ids: &[i64]) -> RelationOrderer {
        RelationOrderer::new(
            ids.iter()
                .enumerate()
                .map(|(index, n)| (id(*n), (index + 1) as f64)),
        )
    }

    fn orders(orderer: &RelationOrderer) -> Vec<(RelationId, f64)> {
        orderer.order_map()
    }

    #[test]
    fn connects_append_at_the_back_by_default() {
        let mut orderer = existing(&[10, 20]);
        orderer.connect(&Connect::new(30)).unwrap();
        assert_eq!(
            orders(&orderer),
            [(id(10), 1.0), (id(20), 2.0), (id(30), 3.0)]
        );
    }

    #[test]
    fn positioned_connects_land_around_their_anchor() {
        let mut orderer = existing(&[10, 20]);
        orderer
            .connect(&Connect::at(15, Position::Before(id(20))))
            .unwrap();
        orderer
            .connect(&Connect::at(5, Position::Start))
            .unwrap();
        orderer
            .connect(&Connect::at(12, Position::After(id(10))))
            .unwrap();
        assert_eq!(
            orders(&orderer),
            [
                (id(5), 1.0),
                (id(10), 2.0),
                (id(12), 3.0),
                (id(15), 4.0),
                (id(20), 5.0),
            ]
        );
    }

    #[test]
    fn anchors_may_come_from_an_earlier_connect() {
        let mut orderer = existing(&[]);
        orderer.connect(&Connect::new(1)).unwrap();
        orderer
            .connect(&Connect::at(2, Position::Before(id(1))))
            .unwrap();
        assert_eq!(orders(&orderer), [(id(2), 1.0), (id(1), 2.0)]);
    }

    #[test]
    fn reconnecting_moves_an_existing_link() {
        let mut orderer = existing(&[10, 20, 30]);
        orderer
            .connect(&Connect::at(30, Position::Start))
            .unwrap();
        assert_eq!(
            orders(&orderer),
            [(id(30), 1.0), (id(10), 2.0), (id(20), 3.0)]
        );
    }

    #[test]
    fn disconnect_removes_and_renumbers() {
        let mut orderer = existing(&[10, 20, 30]);
        orderer.disconnect(&id(20));
        orderer.disconnect(&id(99));
        assert_eq!(orders(&orderer), [(id(10), 1.0), (id(30), 2.0)]);
    }

    #[test]
    fn missing_anchor_appends_unless_strict() {
        let mut orderer = existing(&[10]);
        orderer
            .connect(&Connect::at(2, Position::After(id(99))))
            .unwrap();
        assert_eq!(orders(&orderer), [(id(10), 1.0), (id(2), 2.0)]);

        let mut orderer = existing(&[10]).strict();
        assert_eq!(
            orderer.connect(&Connect::at(2, Position::After(id(99)))),
            Err(OrderingError::MissingAnchor {
                id: id(2),
                anchor: id(99),
            })
        );
    }
}
