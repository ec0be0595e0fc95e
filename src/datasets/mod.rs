use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

mod impl_datasets;
mod impl_design_matrix;
mod impl_targets;


/// A tabular dataset: a design matrix, aligned targets, and the names of the
/// feature columns and of the response variable.
///
/// The dataset is consumed as-is by the estimators. Parsing, type inference and
/// missing-value handling belong to whoever builds it.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetBase<DM, T>
where
    DM: DesignMatrix,
{
    pub design_matrix: DM,
    pub targets: T,
    pub feature_names: Vec<String>,
    pub target_name: String,
}

/// A dataset owning its design matrix and targets
pub type Dataset<F> = DatasetBase<Array2<F>, Array1<F>>;

/// A dataset borrowing its design matrix and targets
pub type DatasetView<'a, F> = DatasetBase<ArrayView2<'a, F>, ArrayView1<'a, F>>;

pub trait DesignMatrix: Sized {
    type Elem;

    fn n_samples(&self) -> usize;
    fn n_features(&self) -> usize;
}

pub trait Targets: Sized {
    type Elem;

    fn n_samples(&self) -> usize;
}
