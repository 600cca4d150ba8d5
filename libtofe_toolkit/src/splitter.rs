use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::cut_file::{CutEvent, CutFile};
use super::error::SplitError;

/// What happens to events that come after the last split's event-number bound.
///
/// The last bound is taken from the reference cut, so events of this cut that are newer
/// than every reference window would fall outside all splits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Leave them out of every split
    #[default]
    Drop,
    /// Put them in the last split
    AppendToLast,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitOptions {
    pub overflow: OverflowPolicy,
    /// Multiplied into every split's weight factor
    pub additional_weight_factor: f64,
}

impl Default for SplitOptions {
    fn default() -> Self {
        Self {
            overflow: OverflowPolicy::Drop,
            additional_weight_factor: 1.0,
        }
    }
}

/// Event-number upper bounds (inclusive) of each split, taken from the reference cut.
///
/// The reference is divided in `split_count` windows of `len / split_count` events; any
/// remainder rows of the reference lie past the last bound.
pub fn split_bounds(reference: &CutFile, split_count: usize) -> Result<Vec<i64>, SplitError> {
    if split_count == 0 {
        return Err(SplitError::InvalidSplitCount(split_count));
    }
    let available = reference.event_count();
    if available < split_count {
        return Err(SplitError::InsufficientReferenceData {
            available,
            required: split_count,
        });
    }

    let window = available / split_count;
    Ok((0..split_count)
        .map(|split| reference.data[(split + 1) * window - 1].event_number)
        .collect())
}

/// Partition events (sorted by event number) into one group per bound.
///
/// Single left-to-right pass: a group takes rows while their event number is within its
/// bound, then the next group starts. Stops when either the rows or the groups run out.
pub fn partition_events(
    data: &[CutEvent],
    bounds: &[i64],
    overflow: OverflowPolicy,
) -> Vec<Vec<CutEvent>> {
    let mut groups: Vec<Vec<CutEvent>> = vec![Vec::new(); bounds.len()];
    let mut row = 0;
    for (group, max_event) in groups.iter_mut().zip(bounds.iter()) {
        if row >= data.len() {
            break;
        }
        while row < data.len() && data[row].event_number <= *max_event {
            group.push(data[row]);
            row += 1;
        }
    }

    if row < data.len() {
        match overflow {
            OverflowPolicy::Drop => log::debug!(
                "Dropping {} events past the last split bound",
                data.len() - row
            ),
            OverflowPolicy::AppendToLast => {
                if let Some(last) = groups.last_mut() {
                    last.extend_from_slice(&data[row..]);
                }
            }
        }
    }

    groups
}

impl CutFile {
    /// Split this cut into `split_count` cuts using the event numbering of `reference`.
    ///
    /// Typically the reference is the heavy recoil cut of the same measurement, so that
    /// every element's splits cover the same stretch of the measurement. The returned cuts
    /// are marked as split products, inherit this cut's metadata and ordinal, and are not
    /// yet saved. The reference is not modified.
    pub fn split(
        &self,
        reference: &CutFile,
        split_count: usize,
        options: &SplitOptions,
    ) -> Result<Vec<CutFile>, SplitError> {
        let bounds = split_bounds(reference, split_count)?;
        if !(options.additional_weight_factor.is_finite() && options.additional_weight_factor > 0.0)
        {
            return Err(SplitError::InvalidWeightFactor(
                options.additional_weight_factor,
            ));
        }
        let groups = partition_events(&self.data, &bounds, options.overflow);

        let splits: Vec<CutFile> = groups
            .into_iter()
            .enumerate()
            .map(|(index, data)| {
                let mut split = CutFile {
                    is_derived_from_split: true,
                    split_index: index,
                    split_count,
                    ..Default::default()
                };
                split.copy_info(self, data, options.additional_weight_factor);
                split
            })
            .collect();

        log::info!(
            "Split {} events of {} into {} parts ({} assigned)",
            self.event_count(),
            self.element
                .as_ref()
                .map(|e| e.to_string())
                .unwrap_or_default(),
            split_count,
            splits.iter().map(CutFile::event_count).sum::<usize>()
        );
        Ok(splits)
    }

    /// Split and immediately save every part under `<dir>/cuts/elemloss/`.
    ///
    /// All parts share this cut's ordinal in their names, and replace earlier splits of
    /// the same cut.
    pub fn split_and_save(
        &self,
        reference: &CutFile,
        split_count: usize,
        options: &SplitOptions,
    ) -> Result<Vec<(CutFile, PathBuf)>, SplitError> {
        let splits = self.split(reference, split_count, options)?;
        let mut saved = Vec::with_capacity(splits.len());
        for split in splits {
            let path = split.save(self.ordinal)?;
            saved.push((split, path));
        }
        Ok(saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{CUTS_DIRECTORY, SPLITS_DIRECTORY};
    use crate::element::Element;
    use crate::selection::{Selection, SelectionType};
    use tempfile::TempDir;

    fn cut_with_events(event_numbers: &[i64]) -> CutFile {
        let mut cut = CutFile::default();
        cut.element = Some(Element::new("H", Some(1)));
        cut.data = event_numbers
            .iter()
            .map(|n| CutEvent::new(100, 200, *n))
            .collect();
        cut
    }

    fn event_numbers(cut: &CutFile) -> Vec<i64> {
        cut.data.iter().map(|e| e.event_number).collect()
    }

    #[test]
    fn test_reference_windows() {
        let reference = cut_with_events(&(0..100).collect::<Vec<i64>>());
        let cut = cut_with_events(&[0, 5, 9, 10, 15, 99]);
        let splits = cut.split(&reference, 10, &SplitOptions::default()).unwrap();

        assert_eq!(splits.len(), 10);
        assert_eq!(event_numbers(&splits[0]), vec![0, 5, 9]);
        assert_eq!(event_numbers(&splits[1]), vec![10, 15]);
        for split in &splits[2..9] {
            assert!(split.data.is_empty());
        }
        assert_eq!(event_numbers(&splits[9]), vec![99]);

        for (idx, split) in splits.iter().enumerate() {
            assert!(split.is_derived_from_split);
            assert_eq!(split.split_index, idx);
            assert_eq!(split.split_count, 10);
            assert_eq!(split.event_count(), split.data.len());
        }
    }

    #[test]
    fn test_overflow_policies() {
        // Reference of 7 events in 3 windows of 2: bounds 1, 3, 5; event 6 is remainder
        let reference = cut_with_events(&[0, 1, 2, 3, 4, 5, 6]);
        let cut = cut_with_events(&[0, 2, 4, 6, 8]);

        let dropped = cut.split(&reference, 3, &SplitOptions::default()).unwrap();
        assert_eq!(
            dropped.iter().map(event_numbers).collect::<Vec<_>>(),
            vec![vec![0], vec![2], vec![4]]
        );

        let options = SplitOptions {
            overflow: OverflowPolicy::AppendToLast,
            ..Default::default()
        };
        let kept = cut.split(&reference, 3, &options).unwrap();
        assert_eq!(event_numbers(&kept[2]), vec![4, 6, 8]);
        let total: usize = kept.iter().map(CutFile::event_count).sum();
        assert_eq!(total, cut.event_count());
    }

    #[test]
    fn test_groups_are_ordered() {
        let reference = cut_with_events(&[1, 3, 3, 8, 12, 12, 20, 31, 40]);
        let cut = cut_with_events(&[0, 1, 2, 3, 3, 4, 9, 12, 13, 25, 31, 45]);
        let splits = cut.split(&reference, 4, &SplitOptions::default()).unwrap();
        let total: usize = splits.iter().map(CutFile::event_count).sum();
        assert!(total <= cut.event_count());

        let non_empty: Vec<&CutFile> = splits.iter().filter(|s| !s.data.is_empty()).collect();
        for pair in non_empty.windows(2) {
            let max = pair[0].data.iter().map(|e| e.event_number).max().unwrap();
            let min = pair[1].data.iter().map(|e| e.event_number).min().unwrap();
            assert!(max <= min);
        }
    }

    #[test]
    fn test_data_exhausted_early() {
        let reference = cut_with_events(&(0..40).collect::<Vec<i64>>());
        let cut = cut_with_events(&[1, 2]);
        let splits = cut.split(&reference, 4, &SplitOptions::default()).unwrap();
        assert_eq!(splits.len(), 4);
        assert_eq!(event_numbers(&splits[0]), vec![1, 2]);
        assert!(splits[1..].iter().all(|s| s.data.is_empty()));
    }

    #[test]
    fn test_invalid_arguments() {
        let reference = cut_with_events(&[0, 1, 2]);
        let cut = cut_with_events(&[0, 1]);
        assert!(matches!(
            cut.split(&reference, 0, &SplitOptions::default()),
            Err(SplitError::InvalidSplitCount(0))
        ));
        assert!(matches!(
            cut.split(&reference, 5, &SplitOptions::default()),
            Err(SplitError::InsufficientReferenceData {
                available: 3,
                required: 5
            })
        ));
        let options = SplitOptions {
            additional_weight_factor: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            cut.split(&reference, 1, &options),
            Err(SplitError::InvalidWeightFactor(_))
        ));
    }

    #[test]
    fn test_weight_compounds() {
        let reference = cut_with_events(&[0, 1, 2, 3]);
        let mut cut = cut_with_events(&[0, 1, 2, 3]);
        cut.weight_factor = 2.0;
        cut.scatter_element = Some(Element::new("Cl", Some(35)));
        let options = SplitOptions {
            additional_weight_factor: 0.5,
            ..Default::default()
        };
        let splits = cut.split(&reference, 2, &options).unwrap();
        for split in splits {
            assert!((split.weight_factor - 1.0).abs() < 1e-12);
            assert_eq!(split.scatter_element, cut.scatter_element);
            assert_eq!(split.element, cut.element);
        }
    }

    #[test]
    fn test_split_and_save() {
        let temp = TempDir::new().unwrap();
        let meas = temp.path().join("meas");
        let selection = Selection::new(Element::new("O", Some(16)), SelectionType::Erd);
        let mut cut = CutFile::new(&meas);
        cut.set_info(
            &selection,
            (0..6).map(|n| CutEvent::new(n, n, n)).collect(),
        );
        cut.ordinal = 3;
        let reference = cut_with_events(&(0..6).collect::<Vec<i64>>());

        let saved = cut
            .split_and_save(&reference, 3, &SplitOptions::default())
            .unwrap();
        assert_eq!(saved.len(), 3);
        for (idx, (split, path)) in saved.iter().enumerate() {
            assert_eq!(
                *path,
                meas.join(CUTS_DIRECTORY)
                    .join(SPLITS_DIRECTORY)
                    .join(format!("meas.16O.3.{idx}.cut"))
            );
            let loaded = CutFile::load(path).unwrap();
            assert_eq!(loaded.data, split.data);
            assert_eq!(loaded.split_index, idx);
            assert_eq!(loaded.split_count, 3);
        }
    }
}
