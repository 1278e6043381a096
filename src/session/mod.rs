//! Session : état mutable + persistance
//!
//! Organisation interne :
//! - etat.rs        : EtatSession et ses opérations atomiques (lignes,
//!                    mémoire, annuler/rétablir, préférences)
//! - persistance.rs : codec JSON (formes actuelle + héritée)
//!
//! Une session = une valeur. Pas de verrou interne : un appelant concurrent
//! construit sa propre EtatSession, jamais deux mutations sur la même.

pub mod etat;
pub mod persistance;

#[cfg(test)]
mod tests_persistance;

#[cfg(test)]
mod tests_session;

// API publique minimale
pub use etat::{
    Enregistrement, ErreurLigne, ErreurSession, EtatSession, Sortie, HISTORIQUE_MAX, PRECISION_MAX,
};
pub use persistance::{charger, sauver, ErreurPersistance};
