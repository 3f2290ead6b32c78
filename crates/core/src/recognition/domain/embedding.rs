/// Face embedding produced by the embedding model.
///
/// Stored as given; distance computations do not assume unit norm.
#[derive(Clone, Debug, PartialEq)]
pub struct Embedding(Vec<f32>);

impl Embedding {
    pub fn new(values: Vec<f32>) -> Self {
        Self(values)
    }

    /// Builds an embedding and scales it to unit length.
    pub fn normalized(mut values: Vec<f32>) -> Self {
        l2_normalize(&mut values);
        Self(values)
    }

    pub fn values(&self) -> &[f32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn norm(&self) -> f64 {
        self.0
            .iter()
            .map(|x| (*x as f64) * (*x as f64))
            .sum::<f64>()
            .sqrt()
    }

    /// `1 - dot(a, b) / (|a| |b|)`. Zero-length or zero-norm inputs are
    /// maximally distant.
    pub fn cosine_distance(&self, other: &Embedding) -> f64 {
        let denom = self.norm() * other.norm();
        if denom == 0.0 || self.len() != other.len() {
            return 2.0;
        }
        let dot: f64 = self
            .0
            .iter()
            .zip(other.0.iter())
            .map(|(a, b)| (*a as f64) * (*b as f64))
            .sum();
        1.0 - dot / denom
    }

    /// Element-wise mean of `embeddings`, renormalized to unit length.
    ///
    /// `None` for an empty slice or mismatched lengths.
    pub fn mean(embeddings: &[&Embedding]) -> Option<Embedding> {
        let first = embeddings.first()?;
        let dim = first.len();
        if embeddings.iter().any(|e| e.len() != dim) {
            return None;
        }

        let mut sum = vec![0.0f64; dim];
        for e in embeddings {
            for (acc, v) in sum.iter_mut().zip(e.values()) {
                *acc += *v as f64;
            }
        }
        let count = embeddings.len() as f64;
        let mean: Vec<f32> = sum.into_iter().map(|s| (s / count) as f32).collect();
        Some(Embedding::normalized(mean))
    }
}

pub fn l2_normalize(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}
