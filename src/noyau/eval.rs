//! Noyau : évaluation
//!
//! Réduit un AST validé + une table de symboles en une valeur, sous l'un des
//! deux backends :
//! - Flottant : f64 binaire double précision, fonctions et constantes
//!   (pi, e) disponibles ; on assume ses arrondis.
//! - Decimal  : rationnel exact construit depuis le TEXTE du littéral
//!   (jamais via un flottant binaire), opérateurs seulement ; tout Appel
//!   est refusé avec une erreur dédiée, avant même d'évaluer ses arguments.
//!
//! La division par zéro (/, %, //) est une erreur métier récupérable, jamais
//! un infini ou un NaN propagé.
//!
//! Le noyau ne touche aucun état : la session assemble une TableSymboles par
//! évaluation et consomme le résultat.

use std::collections::HashMap;

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};

use super::expr::{Expr, OpBinaire, OpUnaire};

/// Garde-fou : borne sur l'exposant entier en mode décimal (anti-gel,
/// un rationnel exact à exposant libre explose en mémoire).
const EXPOSANT_MAX: u32 = 65_536;

/// Backend numérique actif.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Flottant,
    Decimal,
}

/// Résultat d'une évaluation.
#[derive(Clone, Debug, PartialEq)]
pub enum Valeur {
    Flottant(f64),
    Exact(BigRational),
}

impl Valeur {
    /// Lecture f64 (la session stocke ans/mem/vars en f64, format JSON oblige).
    pub fn comme_f64(&self) -> f64 {
        match self {
            Valeur::Flottant(v) => *v,
            Valeur::Exact(r) => r.to_f64().unwrap_or(f64::NAN),
        }
    }
}

/// Erreur d'évaluation (récupérable, jamais une panique).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ErreurEval {
    #[error("identifiant inconnu: {0}")]
    IdentifiantInconnu(String),

    #[error("division par zéro")]
    DivisionParZero,

    #[error("fonctions indisponibles en mode décimal")]
    FonctionsIndisponibles,

    #[error("opération non supportée en mode décimal: {0}")]
    OperationNonSupportee(String),

    #[error("littéral invalide: {0}")]
    LitteralInvalide(String),

    #[error("valeur non finie: {0}")]
    ValeurNonFinie(String),
}

/* ------------------------ Table de symboles ------------------------ */

/// Résolution à trois étages, priorité documentée et testable :
/// réservés (ans, mem, toujours prioritaires) > variables utilisateur >
/// constantes (pi, e, mode flottant seulement).
///
/// Une vue par évaluation : la session la reconstruit à chaque ligne.
pub struct TableSymboles<'a> {
    ans: Option<f64>,
    mem: f64,
    vars: &'a HashMap<String, f64>,
    constantes: bool,
}

impl<'a> TableSymboles<'a> {
    pub fn new(ans: Option<f64>, mem: f64, vars: &'a HashMap<String, f64>, constantes: bool) -> Self {
        Self {
            ans,
            mem,
            vars,
            constantes,
        }
    }

    /// Lookup par nom (déjà en minuscules). None = identifiant inconnu.
    pub fn resoudre(&self, nom: &str) -> Option<f64> {
        // étage 1 : réservés
        match nom {
            "ans" => return self.ans,
            "mem" => return Some(self.mem),
            _ => {}
        }
        // étage 2 : variables utilisateur
        if let Some(v) = self.vars.get(nom) {
            return Some(*v);
        }
        // étage 3 : constantes (flottant seulement)
        if self.constantes {
            match nom {
                "pi" => return Some(std::f64::consts::PI),
                "e" => return Some(std::f64::consts::E),
                _ => {}
            }
        }
        None
    }
}

/* ------------------------ Entrée unique ------------------------ */

/// Évalue un AST validé sous le backend demandé.
pub fn evaluer(expr: &Expr, symboles: &TableSymboles<'_>, mode: Mode) -> Result<Valeur, ErreurEval> {
    match mode {
        Mode::Flottant => eval_flottant(expr, symboles).map(Valeur::Flottant),
        Mode::Decimal => eval_decimal(expr, symboles).map(Valeur::Exact),
    }
}

/* ------------------------ Backend flottant ------------------------ */

fn eval_flottant(expr: &Expr, symboles: &TableSymboles<'_>) -> Result<f64, ErreurEval> {
    match expr {
        Expr::Nombre(texte) => texte
            .parse::<f64>()
            .map_err(|_| ErreurEval::LitteralInvalide(texte.clone())),

        Expr::Ident(nom) => symboles
            .resoudre(nom)
            .ok_or_else(|| ErreurEval::IdentifiantInconnu(nom.clone())),

        Expr::Unaire(op, x) => {
            let v = eval_flottant(x, symboles)?;
            Ok(match op {
                OpUnaire::Plus => v,
                OpUnaire::Moins => -v,
            })
        }

        Expr::Binaire(op, a, b) => {
            let va = eval_flottant(a, symboles)?;
            let vb = eval_flottant(b, symboles)?;
            match op {
                OpBinaire::Add => Ok(va + vb),
                OpBinaire::Sub => Ok(va - vb),
                OpBinaire::Mul => Ok(va * vb),
                OpBinaire::Pow => Ok(va.powf(vb)),
                OpBinaire::Div => {
                    if vb == 0.0 {
                        Err(ErreurEval::DivisionParZero)
                    } else {
                        Ok(va / vb)
                    }
                }
                OpBinaire::Rem => {
                    if vb == 0.0 {
                        Err(ErreurEval::DivisionParZero)
                    } else {
                        Ok(modulo_plancher(va, vb))
                    }
                }
                OpBinaire::FloorDiv => {
                    if vb == 0.0 {
                        Err(ErreurEval::DivisionParZero)
                    } else {
                        Ok((va / vb).floor())
                    }
                }
            }
        }

        Expr::Appel(nom, args) => {
            let mut valeurs = Vec::with_capacity(args.len());
            for a in args {
                valeurs.push(eval_flottant(a, symboles)?);
            }
            appliquer_fonction(nom, &valeurs)
        }
    }
}

/// Reste plancher : le résultat prend le signe du diviseur, cohérent
/// avec `//`.
fn modulo_plancher(a: f64, b: f64) -> f64 {
    let r = a % b;
    if r != 0.0 && (r < 0.0) != (b < 0.0) {
        r + b
    } else {
        r
    }
}

/// Dispatch des fonctions de la liste blanche (backend flottant seulement).
/// L'arité a déjà été validée ; un désaccord ici est traité en erreur douce,
/// pas en panique.
fn appliquer_fonction(nom: &str, valeurs: &[f64]) -> Result<f64, ErreurEval> {
    let unaire = |v: &[f64]| -> Result<f64, ErreurEval> {
        match v {
            [x] => Ok(*x),
            _ => Err(ErreurEval::LitteralInvalide(format!(
                "{nom}: arité inattendue"
            ))),
        }
    };

    match nom {
        "sqrt" => Ok(unaire(valeurs)?.sqrt()),
        "sin" => Ok(unaire(valeurs)?.sin()),
        "cos" => Ok(unaire(valeurs)?.cos()),
        "tan" => Ok(unaire(valeurs)?.tan()),
        "log" => Ok(unaire(valeurs)?.ln()),
        "log10" => Ok(unaire(valeurs)?.log10()),
        "exp" => Ok(unaire(valeurs)?.exp()),
        "abs" => Ok(unaire(valeurs)?.abs()),
        "round" => match valeurs {
            [x] => Ok(x.round()),
            // le 2e argument est ramené à un nombre entier de décimales
            // (troncature) avant le dispatch ; négatif = dizaines, centaines…
            [x, n] => Ok(arrondir(*x, n.trunc() as i64)),
            _ => Err(ErreurEval::LitteralInvalide(
                "round: arité inattendue".into(),
            )),
        },
        _ => Err(ErreurEval::IdentifiantInconnu(nom.to_string())),
    }
}

fn arrondir(x: f64, chiffres: i64) -> f64 {
    // au-delà, le facteur 10^n déborde de toute façon en inf/0
    let chiffres = chiffres.clamp(-308, 308) as i32;
    let facteur = 10f64.powi(chiffres);
    (x * facteur).round() / facteur
}

/* ------------------------ Backend décimal exact ------------------------ */

fn eval_decimal(expr: &Expr, symboles: &TableSymboles<'_>) -> Result<BigRational, ErreurEval> {
    match expr {
        Expr::Nombre(texte) => {
            decimal_exact(texte).ok_or_else(|| ErreurEval::LitteralInvalide(texte.clone()))
        }

        Expr::Ident(nom) => {
            let v = symboles
                .resoudre(nom)
                .ok_or_else(|| ErreurEval::IdentifiantInconnu(nom.clone()))?;
            // ans/mem/vars vivent en f64 ; leur valeur rationnelle exacte
            // est reprise telle quelle (tout f64 fini est un rationnel)
            BigRational::from_float(v).ok_or_else(|| ErreurEval::ValeurNonFinie(nom.clone()))
        }

        Expr::Unaire(op, x) => {
            let v = eval_decimal(x, symboles)?;
            Ok(match op {
                OpUnaire::Plus => v,
                OpUnaire::Moins => -v,
            })
        }

        Expr::Binaire(op, a, b) => {
            let va = eval_decimal(a, symboles)?;
            let vb = eval_decimal(b, symboles)?;
            match op {
                OpBinaire::Add => Ok(va + vb),
                OpBinaire::Sub => Ok(va - vb),
                OpBinaire::Mul => Ok(va * vb),
                OpBinaire::Div => {
                    if vb.is_zero() {
                        Err(ErreurEval::DivisionParZero)
                    } else {
                        Ok(va / vb)
                    }
                }
                OpBinaire::Rem => {
                    if vb.is_zero() {
                        Err(ErreurEval::DivisionParZero)
                    } else {
                        // a - b*floor(a/b) : même convention plancher que //
                        let q = (va.clone() / vb.clone()).floor();
                        Ok(va - vb * q)
                    }
                }
                OpBinaire::FloorDiv => {
                    if vb.is_zero() {
                        Err(ErreurEval::DivisionParZero)
                    } else {
                        Ok((va / vb).floor())
                    }
                }
                OpBinaire::Pow => puissance_decimale(va, &vb),
            }
        }

        // refusé AVANT d'évaluer les arguments : erreur dédiée, visible
        // telle quelle par l'utilisateur
        Expr::Appel(_, _) => Err(ErreurEval::FonctionsIndisponibles),
    }
}

/// `**` en mode décimal : exposant entier >= 0 seulement.
fn puissance_decimale(base: BigRational, exposant: &BigRational) -> Result<BigRational, ErreurEval> {
    if !exposant.is_integer() {
        return Err(ErreurEval::OperationNonSupportee(
            "exposant fractionnaire".into(),
        ));
    }
    if exposant.is_negative() {
        return Err(ErreurEval::OperationNonSupportee("exposant négatif".into()));
    }

    let n = exposant
        .to_integer()
        .to_u32()
        .filter(|n| *n <= EXPOSANT_MAX)
        .ok_or_else(|| ErreurEval::OperationNonSupportee("exposant trop grand".into()))?;

    Ok(puissance_rationnelle(base, n))
}

/// Exponentiation rapide (carré-multiplication).
fn puissance_rationnelle(base: BigRational, exp: u32) -> BigRational {
    let mut e = exp;
    let mut acc = BigRational::one();
    let mut b = base;

    while e > 0 {
        if (e & 1) == 1 {
            acc *= b.clone();
        }
        e >>= 1;
        if e > 0 {
            b *= b.clone();
        }
    }
    acc
}

/// Rationnel exact depuis le texte source d'un littéral décimal
/// ("0.1" -> 1/10, jamais via un flottant binaire).
fn decimal_exact(texte: &str) -> Option<BigRational> {
    let (ent, frac) = match texte.split_once('.') {
        Some((e, f)) => (e, f),
        None => (texte, ""),
    };

    let chiffres = format!("{ent}{frac}");
    if chiffres.is_empty() || !chiffres.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let n = BigInt::parse_bytes(chiffres.as_bytes(), 10)?;
    let d = BigInt::from(10).pow(frac.len() as u32);
    Some(BigRational::new(n, d))
}
