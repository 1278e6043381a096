// src/noyau/rpn.rs
//
// Shunting-yard -> RPN -> AST
//
// Règles:
// - Ident suivi de '(' => appel de fonction ; le nom est vérifié contre la
//   liste blanche DÈS ICI (le validateur re-vérifie derrière, ceinture et
//   bretelles). L'appel reste sur la pile jusqu'à sa parenthèse fermante,
//   son arité (virgules + 1) est portée dans le jeton RPN.
// - '+'/'-' en position de préfixe => opérateur unaire, priorité maximale
//   (au-dessus de '**' : "-2**2" se lit "(-2)**2"). Pas d'injection "0 - x",
//   elle donnerait au moins unaire la priorité du moins binaire.
// - '**' associatif à droite ; tout le reste à gauche.
//
// Chaque jeton RPN garde la position du jeton source, pour que toute erreur
// de construction remonte avec un décalage exploitable.

use super::expr::{Expr, OpBinaire, OpUnaire};
use super::jetons::{tokenize, ErreurSyntaxe, Jeton, Sorte};
use super::valide::chercher_fonction;

/// Élément de notation polonaise inversée, positionné.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum JetonRpn {
    Nombre(String, usize),
    Ident(String, usize),
    Unaire(OpUnaire, usize),
    Binaire(OpBinaire, usize),
    /// nom, position, nombre d'arguments
    Appel(String, usize, usize),
}

/// Pile d'opérateurs du shunting-yard.
enum OpPile {
    Unaire(OpUnaire, usize),
    Binaire(OpBinaire, usize),
    ParG {
        pos: usize,
        /// Some((nom, pos)) si la parenthèse ouvre un appel de fonction.
        fonction: Option<(String, usize)>,
        /// virgules rencontrées dans ce groupe
        virgules: usize,
    },
}

fn precedence(op: OpBinaire) -> i32 {
    match op {
        OpBinaire::Add | OpBinaire::Sub => 1,
        OpBinaire::Mul | OpBinaire::Div | OpBinaire::Rem | OpBinaire::FloorDiv => 2,
        OpBinaire::Pow => 3,
    }
}

/// Les unaires lient plus fort que tout opérateur binaire.
const PRECEDENCE_UNAIRE: i32 = 4;

fn droite_associatif(op: OpBinaire) -> bool {
    matches!(op, OpBinaire::Pow)
}

fn op_binaire(sorte: &Sorte) -> Option<OpBinaire> {
    match sorte {
        Sorte::Plus => Some(OpBinaire::Add),
        Sorte::Moins => Some(OpBinaire::Sub),
        Sorte::Etoile => Some(OpBinaire::Mul),
        Sorte::Barre => Some(OpBinaire::Div),
        Sorte::DoubleEtoile => Some(OpBinaire::Pow),
        Sorte::Pourcent => Some(OpBinaire::Rem),
        Sorte::DoubleBarre => Some(OpBinaire::FloorDiv),
        _ => None,
    }
}

/* ------------------------ Jetons -> RPN ------------------------ */

/// Convertit une suite de jetons en RPN.
pub fn to_rpn(jetons: &[Jeton]) -> Result<Vec<JetonRpn>, ErreurSyntaxe> {
    let mut out: Vec<JetonRpn> = Vec::new();
    let mut ops: Vec<OpPile> = Vec::new();

    // "valeur" = un atome ou une expression fermée vient d'être produite.
    // Sert à distinguer préfixe/binaire et à détecter les juxtapositions.
    let mut prev_valeur = false;
    // le jeton précédent est la '(' encore au sommet (détection de "()")
    let mut prev_parg = false;

    let mut k = 0usize;
    while k < jetons.len() {
        let j = &jetons[k];

        match &j.sorte {
            Sorte::Nombre(t) => {
                if prev_valeur {
                    return Err(ErreurSyntaxe::new(j.pos, "opérateur attendu"));
                }
                out.push(JetonRpn::Nombre(t.clone(), j.pos));
                prev_valeur = true;
                prev_parg = false;
            }

            Sorte::Ident(nom) => {
                if prev_valeur {
                    return Err(ErreurSyntaxe::new(j.pos, "opérateur attendu"));
                }
                // appel de fonction ? (ident collé à une parenthèse ouvrante)
                if jetons.get(k + 1).map(|s| &s.sorte) == Some(&Sorte::ParG) {
                    if chercher_fonction(nom).is_none() {
                        return Err(ErreurSyntaxe::new(
                            j.pos,
                            format!("fonction inconnue: {nom}"),
                        ));
                    }
                    ops.push(OpPile::ParG {
                        pos: jetons[k + 1].pos,
                        fonction: Some((nom.clone(), j.pos)),
                        virgules: 0,
                    });
                    prev_valeur = false;
                    prev_parg = true;
                    k += 2;
                    continue;
                }
                out.push(JetonRpn::Ident(nom.clone(), j.pos));
                prev_valeur = true;
                prev_parg = false;
            }

            Sorte::ParG => {
                if prev_valeur {
                    return Err(ErreurSyntaxe::new(j.pos, "opérateur attendu"));
                }
                ops.push(OpPile::ParG {
                    pos: j.pos,
                    fonction: None,
                    virgules: 0,
                });
                prev_valeur = false;
                prev_parg = true;
            }

            Sorte::ParD => {
                if !prev_valeur && !prev_parg {
                    return Err(ErreurSyntaxe::new(j.pos, "valeur attendue avant ')'"));
                }
                loop {
                    match ops.pop() {
                        None => {
                            return Err(ErreurSyntaxe::new(
                                j.pos,
                                "parenthèse fermante sans ouvrante",
                            ));
                        }
                        Some(OpPile::Unaire(op, pos)) => out.push(JetonRpn::Unaire(op, pos)),
                        Some(OpPile::Binaire(op, pos)) => out.push(JetonRpn::Binaire(op, pos)),
                        Some(OpPile::ParG {
                            fonction, virgules, ..
                        }) => {
                            match fonction {
                                Some((nom, pos_nom)) => {
                                    let nargs = if prev_parg { 0 } else { virgules + 1 };
                                    out.push(JetonRpn::Appel(nom, pos_nom, nargs));
                                }
                                None => {
                                    if prev_parg {
                                        return Err(ErreurSyntaxe::new(
                                            j.pos,
                                            "parenthèses vides",
                                        ));
                                    }
                                }
                            }
                            break;
                        }
                    }
                }
                prev_valeur = true;
                prev_parg = false;
            }

            Sorte::Virgule => {
                if !prev_valeur {
                    return Err(ErreurSyntaxe::new(j.pos, "virgule inattendue"));
                }
                // dépile jusqu'à la '(' la plus proche, sans la retirer
                loop {
                    let appel_au_sommet = match ops.last() {
                        None | Some(OpPile::ParG { fonction: None, .. }) => {
                            return Err(ErreurSyntaxe::new(
                                j.pos,
                                "virgule hors d'un appel de fonction",
                            ));
                        }
                        Some(OpPile::ParG {
                            fonction: Some(_), ..
                        }) => true,
                        Some(_) => false,
                    };

                    if appel_au_sommet {
                        if let Some(OpPile::ParG { virgules, .. }) = ops.last_mut() {
                            *virgules += 1;
                        }
                        break;
                    }

                    match ops.pop() {
                        Some(OpPile::Unaire(op, pos)) => out.push(JetonRpn::Unaire(op, pos)),
                        Some(OpPile::Binaire(op, pos)) => out.push(JetonRpn::Binaire(op, pos)),
                        _ => unreachable!("ParG traité au-dessus"),
                    }
                }
                prev_valeur = false;
                prev_parg = false;
            }

            // opérateurs
            sorte => {
                let op = match op_binaire(sorte) {
                    Some(op) => op,
                    None => unreachable!("toutes les sortes sont couvertes"),
                };

                // préfixe ? (seulement +/-)
                if !prev_valeur {
                    let unaire = match sorte {
                        Sorte::Plus => Some(OpUnaire::Plus),
                        Sorte::Moins => Some(OpUnaire::Moins),
                        _ => None,
                    };
                    match unaire {
                        Some(u) => {
                            // préfixe : rien à sa gauche ne peut le capturer,
                            // on empile sans dépiler
                            ops.push(OpPile::Unaire(u, j.pos));
                            prev_parg = false;
                            k += 1;
                            continue;
                        }
                        None => {
                            return Err(ErreurSyntaxe::new(j.pos, "valeur attendue"));
                        }
                    }
                }

                // binaire : dépile selon priorité/associativité
                let p_tok = precedence(op);
                loop {
                    let doit_sortir = match ops.last() {
                        Some(OpPile::Unaire(..)) => PRECEDENCE_UNAIRE > p_tok,
                        Some(OpPile::Binaire(haut, _)) => {
                            let p_haut = precedence(*haut);
                            if droite_associatif(op) {
                                p_haut > p_tok
                            } else {
                                p_haut >= p_tok
                            }
                        }
                        Some(OpPile::ParG { .. }) | None => false,
                    };
                    if !doit_sortir {
                        break;
                    }
                    match ops.pop() {
                        Some(OpPile::Unaire(u, pos)) => out.push(JetonRpn::Unaire(u, pos)),
                        Some(OpPile::Binaire(b, pos)) => out.push(JetonRpn::Binaire(b, pos)),
                        _ => unreachable!("ParG filtré au-dessus"),
                    }
                }
                ops.push(OpPile::Binaire(op, j.pos));
                prev_valeur = false;
                prev_parg = false;
            }
        }

        k += 1;
    }

    let pos_fin = jetons.last().map(|j| j.pos + 1).unwrap_or(0);
    if !prev_valeur {
        return Err(ErreurSyntaxe::new(pos_fin, "expression incomplète"));
    }

    // vide la pile
    while let Some(op) = ops.pop() {
        match op {
            OpPile::Unaire(u, pos) => out.push(JetonRpn::Unaire(u, pos)),
            OpPile::Binaire(b, pos) => out.push(JetonRpn::Binaire(b, pos)),
            OpPile::ParG { pos, .. } => {
                return Err(ErreurSyntaxe::new(pos, "parenthèse non fermée"));
            }
        }
    }

    Ok(out)
}

/* ------------------------ RPN -> Expr ------------------------ */

/// Construit l'AST à partir d'une RPN.
///
/// Les cas d'erreur ici sont normalement inatteignables après un to_rpn
/// correct ; on les garde quand même typés plutôt que de paniquer.
pub fn from_rpn(rpn: &[JetonRpn]) -> Result<Expr, ErreurSyntaxe> {
    let mut st: Vec<Expr> = Vec::new();

    for item in rpn {
        match item {
            JetonRpn::Nombre(t, _) => st.push(Expr::Nombre(t.clone())),
            JetonRpn::Ident(n, _) => st.push(Expr::Ident(n.clone())),

            JetonRpn::Unaire(op, pos) => {
                let x = st
                    .pop()
                    .ok_or_else(|| ErreurSyntaxe::new(*pos, "expression invalide"))?;
                st.push(Expr::Unaire(*op, Box::new(x)));
            }

            JetonRpn::Binaire(op, pos) => {
                let b = st
                    .pop()
                    .ok_or_else(|| ErreurSyntaxe::new(*pos, "expression invalide"))?;
                let a = st
                    .pop()
                    .ok_or_else(|| ErreurSyntaxe::new(*pos, "expression invalide"))?;
                st.push(Expr::Binaire(*op, Box::new(a), Box::new(b)));
            }

            JetonRpn::Appel(nom, pos, nargs) => {
                if st.len() < *nargs {
                    return Err(ErreurSyntaxe::new(*pos, "expression invalide"));
                }
                let args = st.split_off(st.len() - nargs);
                st.push(Expr::Appel(nom.clone(), args));
            }
        }
    }

    if st.len() != 1 {
        return Err(ErreurSyntaxe::new(0, "expression invalide"));
    }
    st.pop()
        .ok_or_else(|| ErreurSyntaxe::new(0, "expression invalide"))
}

/* ------------------------ Entrée unique ------------------------ */

/// Parse une ligne source en AST.
///
/// L'entrée vide est filtrée en amont (ligne blanche = no-op de session) ;
/// si elle arrive quand même ici, c'est une erreur en position 0.
pub fn parser(source: &str) -> Result<Expr, ErreurSyntaxe> {
    let jetons = tokenize(source)?;
    if jetons.is_empty() {
        return Err(ErreurSyntaxe::new(0, "expression vide"));
    }
    let rpn = to_rpn(&jetons)?;
    from_rpn(&rpn)
}
