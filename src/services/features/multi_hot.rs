use std::collections::{BTreeSet, HashMap};

use ndarray::Array2;

/// Binary encoder over a fixed label set
///
/// One column per distinct label seen during fitting, in lexicographic order.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiHotEncoder {
    labels: Vec<String>,
    index: HashMap<String, usize>,
}

/// Learns the label set of a list-valued column
pub fn fit_multi_hot_encoder<L: AsRef<[String]>>(column: &[L]) -> MultiHotEncoder {
    let labels: Vec<String> = column
        .iter()
        .flat_map(|labels| labels.as_ref().iter().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let index = labels
        .iter()
        .enumerate()
        .map(|(i, label)| (label.clone(), i))
        .collect();

    MultiHotEncoder { labels, index }
}

impl MultiHotEncoder {
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn width(&self) -> usize {
        self.labels.len()
    }

    /// Dense `rows × labels` 0/1 block; unknown labels are ignored
    pub fn transform<L: AsRef<[String]>>(&self, column: &[L]) -> Array2<f32> {
        let mut block = Array2::zeros((column.len(), self.width()));
        for (labels, mut row) in column.iter().zip(block.rows_mut()) {
            for label in labels.as_ref() {
                if let Some(&i) = self.index.get(label) {
                    row[i] = 1.0;
                }
            }
        }
        block
    }
}
