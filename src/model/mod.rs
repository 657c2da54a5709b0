//! Random-forest training and evaluation

pub mod forest;
pub mod metrics;
pub mod search;
pub mod split;
pub mod trainer;
pub mod tree;

pub use forest::{MaxFeatures, RandomForest};
pub use metrics::{accuracy, ConfusionMatrix, MetricsRecord};
pub use search::{CandidateScore, GridSearch, Hyperparameters, ParamGrid, SearchResult};
pub use split::{stratified_k_fold, train_test_split, Fold, TrainTestSplit};
pub use trainer::{train, ModelTrainer, TrainedModel, TrainerConfig, TrainerStage, TrainingOutcome};
pub use tree::{DecisionTree, TreeNode};
