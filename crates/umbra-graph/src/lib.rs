pub mod classifier;
pub mod converter;
pub mod graph;
pub mod highlight;
pub mod layout;
pub mod path_tree;
pub mod style;

pub use classifier::{ChildGroups, classify, classify_node, group_children};
pub use converter::{GlobalBox, hit_test, resolve_global};
pub use graph::{GraphModel, NodeIndex, Rect, Vec2};
pub use highlight::{HighlightOverlay, HighlightState, HoverEvent, edge_styles, reduce};
pub use layout::{
    CoordinateSpace, LayeredLayouter, LayoutConfig, LayoutResult, Layouter, MacroGraph,
    MacroLayouter, NestingLayouter, PositionedNode, StyledEdge, layout, layout_with,
};
pub use path_tree::{
    PathKind, PathTreeNode, TreeRow, build_tree, dependency_names, sort_tree, visible_rows,
};
pub use style::{Color, EdgeStyle, NodeStyle, get_node_style};
