pub mod tree;
pub mod docx_adapter;
pub mod core_properties;
pub mod run_merger;

// 从 tree 导出
pub use tree::{DocumentTree, NodeData, NodeId, NodeKind};

// 从 docx_adapter 导出
pub use docx_adapter::{DocxAdapterError, DocxAdapterResult, DocxPackage};

// 从 run_merger 导出
pub use run_merger::merge_runs;
