//! Calculatrice Session : évaluateur d'expressions bac-à-sable + session persistante
//!
//! Organisation :
//! - noyau/    : jetons -> RPN -> AST -> validation -> évaluation -> affichage
//!               (pur, sans effet de bord, ré-entrant)
//! - session/  : état mutable (vars, ans, mémoire, historique annuler/rétablir,
//!               préférences) + codec de persistance JSON
//!
//! Contrats :
//! - L'AST est un enum fermé à cinq formes ; rien d'autre n'est constructible.
//! - Le noyau ne touche jamais l'état : la session lui passe une table de
//!   symboles par évaluation et consomme le résultat.
//! - Toute erreur est typée ; le front-end affiche les messages tels quels.

pub mod noyau;
pub mod session;
