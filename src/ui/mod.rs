/// Presentation layer: the top/side panels and the central plot views.
pub mod panels;
pub mod plot;
