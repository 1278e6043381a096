// src/noyau/jetons.rs
//
// Tokenisation d'une ligne d'expression.
//
// Règles:
// - nombres décimaux : 12, 1.5, .5 (un seul point, pas d'exposant)
// - identifiants [a-zA-Z_][a-zA-Z0-9_]* (normalisés en minuscules)
// - opérateurs + - * / ** % // et ( ) ,
// - espaces insignifiants
//
// Tout caractère hors de cette liste blanche est une erreur ICI, avec sa
// position (crochets, guillemets, '=', point isolé...). Défense en
// profondeur : rien d'inattendu n'atteint le parseur.
//
// NOTE: les positions sont des index de *caractères* (pas d'octets), pour
// que le front-end puisse poser un curseur sous la ligne affichée.

use std::fmt;

/// Erreur de syntaxe, avec la position (en caractères) de la faute.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("erreur de syntaxe (position {pos}): {raison}")]
pub struct ErreurSyntaxe {
    pub pos: usize,
    pub raison: String,
}

impl ErreurSyntaxe {
    pub(crate) fn new(pos: usize, raison: impl Into<String>) -> Self {
        Self {
            pos,
            raison: raison.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Sorte {
    /// Littéral numérique, texte source conservé tel quel
    /// (le backend décimal exact le relira sans passer par un flottant).
    Nombre(String),
    /// Identifiant, déjà en minuscules.
    Ident(String),

    Plus,
    Moins,
    Etoile,
    Barre,
    DoubleEtoile, // **
    Pourcent,     // %
    DoubleBarre,  // //
    Virgule,

    ParG,
    ParD,
}

impl fmt::Display for Sorte {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sorte::Nombre(t) => write!(f, "{t}"),
            Sorte::Ident(n) => write!(f, "{n}"),
            Sorte::Plus => write!(f, "+"),
            Sorte::Moins => write!(f, "-"),
            Sorte::Etoile => write!(f, "*"),
            Sorte::Barre => write!(f, "/"),
            Sorte::DoubleEtoile => write!(f, "**"),
            Sorte::Pourcent => write!(f, "%"),
            Sorte::DoubleBarre => write!(f, "//"),
            Sorte::Virgule => write!(f, ","),
            Sorte::ParG => write!(f, "("),
            Sorte::ParD => write!(f, ")"),
        }
    }
}

/// Jeton positionné.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Jeton {
    pub sorte: Sorte,
    pub pos: usize,
}

/// Tokenize une ligne en jetons positionnés.
pub fn tokenize(s: &str) -> Result<Vec<Jeton>, ErreurSyntaxe> {
    let chars: Vec<char> = s.chars().collect();
    let mut out = Vec::new();
    let mut i: usize = 0;

    while i < chars.len() {
        let c = chars[i];

        if c.is_whitespace() {
            i += 1;
            continue;
        }

        // Parenthèses + virgule
        match c {
            '(' => {
                out.push(Jeton {
                    sorte: Sorte::ParG,
                    pos: i,
                });
                i += 1;
                continue;
            }
            ')' => {
                out.push(Jeton {
                    sorte: Sorte::ParD,
                    pos: i,
                });
                i += 1;
                continue;
            }
            ',' => {
                out.push(Jeton {
                    sorte: Sorte::Virgule,
                    pos: i,
                });
                i += 1;
                continue;
            }
            _ => {}
        }

        // Opérateurs (les doubles d'abord : ** et //)
        match c {
            '+' => {
                out.push(Jeton {
                    sorte: Sorte::Plus,
                    pos: i,
                });
                i += 1;
                continue;
            }
            '-' => {
                out.push(Jeton {
                    sorte: Sorte::Moins,
                    pos: i,
                });
                i += 1;
                continue;
            }
            '*' => {
                if chars.get(i + 1) == Some(&'*') {
                    out.push(Jeton {
                        sorte: Sorte::DoubleEtoile,
                        pos: i,
                    });
                    i += 2;
                } else {
                    out.push(Jeton {
                        sorte: Sorte::Etoile,
                        pos: i,
                    });
                    i += 1;
                }
                continue;
            }
            '/' => {
                if chars.get(i + 1) == Some(&'/') {
                    out.push(Jeton {
                        sorte: Sorte::DoubleBarre,
                        pos: i,
                    });
                    i += 2;
                } else {
                    out.push(Jeton {
                        sorte: Sorte::Barre,
                        pos: i,
                    });
                    i += 1;
                }
                continue;
            }
            '%' => {
                out.push(Jeton {
                    sorte: Sorte::Pourcent,
                    pos: i,
                });
                i += 1;
                continue;
            }
            _ => {}
        }

        // Identifiants : [a-zA-Z_][a-zA-Z0-9_]*, insensibles à la casse
        if c.is_ascii_alphabetic() || c == '_' {
            let debut = i;
            i += 1;
            while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            let mot: String = chars[debut..i].iter().collect();
            out.push(Jeton {
                sorte: Sorte::Ident(mot.to_lowercase()),
                pos: debut,
            });
            continue;
        }

        // Nombres : chiffres avec au plus un point ; ".5" accepté.
        if c.is_ascii_digit() || (c == '.' && chars.get(i + 1).is_some_and(|d| d.is_ascii_digit()))
        {
            let debut = i;
            let mut point_vu = false;

            while i < chars.len() {
                let d = chars[i];
                if d.is_ascii_digit() {
                    i += 1;
                } else if d == '.'
                    && !point_vu
                    && chars.get(i + 1).is_some_and(|e| e.is_ascii_digit())
                {
                    point_vu = true;
                    i += 1;
                } else {
                    break;
                }
            }

            // "1.2.3", "1." : le point orphelin est refusé ici, pas plus loin
            if chars.get(i) == Some(&'.') {
                return Err(ErreurSyntaxe::new(i, "point inattendu"));
            }

            let texte: String = chars[debut..i].iter().collect();
            out.push(Jeton {
                sorte: Sorte::Nombre(texte),
                pos: debut,
            });
            continue;
        }

        // Un '.' qui n'introduit pas de fraction (accès attribut, "1.2.3"...)
        if c == '.' {
            return Err(ErreurSyntaxe::new(i, "point inattendu"));
        }

        return Err(ErreurSyntaxe::new(i, format!("caractère inattendu: '{c}'")));
    }

    Ok(out)
}

/// Liste de jetons en texte (diagnostics).
pub fn format_jetons(jetons: &[Jeton]) -> String {
    let mut morceaux = Vec::with_capacity(jetons.len());
    for j in jetons {
        morceaux.push(j.sorte.to_string());
    }
    morceaux.join(" ")
}
