// src/noyau/valide.rs
//
// Validation structurelle de l'AST, indépendante du backend numérique.
//
// L'enum Expr est fermé : le match ci-dessous est exhaustif, et le
// compilateur refuse toute forme de nœud oubliée. La liste blanche des
// fonctions vit ICI et seulement ici : le parseur la consulte pour refuser
// un appel inconnu dès la syntaxe, le validateur la re-vérifie derrière
// (ceinture et bretelles : une extension future de la grammaire ne peut pas
// faire passer une forme imprévue jusqu'à l'évaluation).

use super::expr::Expr;

/// Erreur de validation (nœud Appel hors contrat).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ErreurValidation {
    #[error("fonction inconnue: {0}")]
    FonctionInconnue(String),

    #[error("{nom}: {recu} argument(s), attendu {attendu}")]
    AriteInvalide {
        nom: String,
        recu: usize,
        attendu: String,
    },
}

/// Entrée de la liste blanche : nom + bornes d'arité.
pub struct Fonction {
    pub nom: &'static str,
    pub arite_min: usize,
    pub arite_max: usize,
}

/// La liste blanche complète. `round` accepte 1 ou 2 arguments
/// (valeur, nombre de décimales) ; tout le reste est strictement unaire.
pub const FONCTIONS: &[Fonction] = &[
    Fonction {
        nom: "sqrt",
        arite_min: 1,
        arite_max: 1,
    },
    Fonction {
        nom: "sin",
        arite_min: 1,
        arite_max: 1,
    },
    Fonction {
        nom: "cos",
        arite_min: 1,
        arite_max: 1,
    },
    Fonction {
        nom: "tan",
        arite_min: 1,
        arite_max: 1,
    },
    Fonction {
        nom: "log",
        arite_min: 1,
        arite_max: 1,
    },
    Fonction {
        nom: "log10",
        arite_min: 1,
        arite_max: 1,
    },
    Fonction {
        nom: "exp",
        arite_min: 1,
        arite_max: 1,
    },
    Fonction {
        nom: "abs",
        arite_min: 1,
        arite_max: 1,
    },
    Fonction {
        nom: "round",
        arite_min: 1,
        arite_max: 2,
    },
];

/// Cherche une fonction par nom (déjà en minuscules).
pub fn chercher_fonction(nom: &str) -> Option<&'static Fonction> {
    FONCTIONS.iter().find(|f| f.nom == nom)
}

/// Confirme récursivement que chaque nœud est l'une des cinq formes
/// permises et que chaque Appel respecte nom + arité.
pub fn valider(expr: &Expr) -> Result<(), ErreurValidation> {
    match expr {
        Expr::Nombre(_) | Expr::Ident(_) => Ok(()),

        Expr::Unaire(_, x) => valider(x),

        Expr::Binaire(_, a, b) => {
            valider(a)?;
            valider(b)
        }

        Expr::Appel(nom, args) => {
            let f = chercher_fonction(nom)
                .ok_or_else(|| ErreurValidation::FonctionInconnue(nom.clone()))?;

            if args.len() < f.arite_min || args.len() > f.arite_max {
                let attendu = if f.arite_min == f.arite_max {
                    f.arite_min.to_string()
                } else {
                    format!("{} à {}", f.arite_min, f.arite_max)
                };
                return Err(ErreurValidation::AriteInvalide {
                    nom: nom.clone(),
                    recu: args.len(),
                    attendu,
                });
            }

            for a in args {
                valider(a)?;
            }
            Ok(())
        }
    }
}
