//! Core of the architekt diagram editor: the component catalog, the live diagram and
//! its mutations, the side-panel models, and the gateways for storage and generation.

pub mod canvas;
pub mod catalog;
pub mod check;
pub mod config;
pub mod editor;
pub mod gateway;
pub mod ids;
pub mod model;
pub mod panel;
pub mod session;
pub mod settings;
pub mod store;

pub use canvas::{CanvasEvent, Effect};
pub use catalog::{Catalog, CatalogError, ComponentSchema, ConfigParameter};
pub use check::{check, Issue};
pub use config::{ConfigError, ConfigMap, ConfigValue, ParamKind};
pub use editor::{EdgeStyleUpdate, Editor, EditorError, Selection, Trust};
pub use gateway::{DesignGenerator, GatewayError, ValidationReport};
pub use model::{Diagram, Edge, EdgeStyle, Node, NodeData, NodeStyle, Position};
pub use panel::{EdgePanel, NodePanel};
pub use session::{Notice, NoticeLevel, Session, SessionError};
pub use settings::{ai_configured, architekt_dir, read_settings, AiSettings};
pub use store::{DesignStore, DesignSummary, FileStore, MemoryStore, StoreError};
