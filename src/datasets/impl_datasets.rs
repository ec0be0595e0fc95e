use super::{DatasetBase, DatasetView, DesignMatrix, Targets};
use ndarray::{ArrayBase, Data, Ix1, Ix2};

/// This implementation block provides a method for the creation of datasets
/// from dense matrices.
impl<F, D: Data<Elem = F>, T: Targets> From<(ArrayBase<D, Ix2>, T)>
    for DatasetBase<ArrayBase<D, Ix2>, T>
{
    fn from(data: (ArrayBase<D, Ix2>, T)) -> Self {
        DatasetBase::new(data.0, data.1)
    }
}

/// This implementation block provides methods to get record and target objects
/// from the dataset.
impl<DM: DesignMatrix, T: Targets> DatasetBase<DM, T> {
    /// This method instantiates a new dataset from a design matrix and targets.
    /// Feature and target names are left empty.
    pub fn new(design_matrix: DM, targets: T) -> DatasetBase<DM, T> {
        DatasetBase {
            design_matrix,
            targets,
            feature_names: Vec::new(),
            target_name: String::new(),
        }
    }

    /// Attaches one name per column of the design matrix.
    pub fn with_feature_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.feature_names = names.into_iter().map(Into::into).collect();
        self
    }

    /// Attaches the name of the response variable.
    pub fn with_target_name<S: Into<String>>(mut self, name: S) -> Self {
        self.target_name = name.into();
        self
    }

    /// This method is a getter for the targets.
    pub fn targets(&self) -> &T {
        &self.targets
    }

    /// This method is a getter for the design matrix.
    pub fn design_matrix(&self) -> &DM {
        &self.design_matrix
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn target_name(&self) -> &str {
        &self.target_name
    }

    pub fn n_samples(&self) -> usize {
        self.design_matrix.n_samples()
    }

    pub fn n_features(&self) -> usize {
        self.design_matrix.n_features()
    }
}

impl<F, D: Data<Elem = F>, S: Data<Elem = F>> DatasetBase<ArrayBase<D, Ix2>, ArrayBase<S, Ix1>> {
    /// Borrows the design matrix and the targets. Names are copied.
    pub fn view(&self) -> DatasetView<'_, F> {
        DatasetBase {
            design_matrix: self.design_matrix.view(),
            targets: self.targets.view(),
            feature_names: self.feature_names.clone(),
            target_name: self.target_name.clone(),
        }
    }
}
