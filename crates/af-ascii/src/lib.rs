//! Moteur de conversion ASCII : pixel → glyphe + couleur ANSI-256.
pub mod luminance;
/// Frame RGB → grille de cellules colorées.
pub mod renderer;
