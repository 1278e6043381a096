// src/noyau/format.rs
//
// Affichage d'une Valeur sous les préférences de session :
// - precision : Some(p) = p décimales fixes (arrondi demi-éloigné, comme
//   {:.p$} sur les flottants) ; None = forme courte (zéros de queue taillés
//   côté exact)
// - milliers  : groupement ',' de la partie entière (notation simple)
// - notation  : simple / scientifique / ingénieur (exposant multiple de 3,
//   mantisse dans [1, 1000))
//
// Les valeurs exactes sont rendues par arithmétique de chaînes sur BigInt
// (entier "scalé" ×10^digits), jamais via un passage par f64.

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};
use serde::{Deserialize, Serialize};

use super::eval::Valeur;

/// Décimales affichées quand la précision est "off" (côté exact ; un
/// rationnel comme 1/3 n'a pas d'écriture décimale finie).
pub const DIGITS_DEFAUT: usize = 12;

/// Notation d'affichage. Les noms sérialisés sont le contrat du fichier
/// de session ("plain" / "scientific" / "engineering").
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Notation {
    #[default]
    Plain,
    Scientific,
    Engineering,
}

/// Préférences d'affichage d'une session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Affichage {
    pub precision: Option<u8>,
    pub milliers: bool,
    pub notation: Notation,
}

/// Rend une valeur selon les préférences.
pub fn formater_valeur(v: &Valeur, a: &Affichage) -> String {
    match v {
        Valeur::Flottant(x) => formater_f64(*x, a),
        Valeur::Exact(r) => formater_exact(r, a),
    }
}

/* ------------------------ Flottant ------------------------ */

fn formater_f64(x: f64, a: &Affichage) -> String {
    // non-fini : affichage direct, aucune notation ne s'applique
    if !x.is_finite() {
        return if x.is_nan() {
            "NaN".to_string()
        } else if x > 0.0 {
            "inf".to_string()
        } else {
            "-inf".to_string()
        };
    }

    match a.notation {
        Notation::Plain => {
            let brut = match a.precision {
                Some(p) => format!("{:.*}", p as usize, x),
                None => format!("{x}"),
            };
            if a.milliers {
                grouper_milliers(&brut)
            } else {
                brut
            }
        }
        Notation::Scientific => match a.precision {
            Some(p) => format!("{:.*e}", p as usize, x),
            None => format!("{x:e}"),
        },
        Notation::Engineering => ingenieur_f64(x, a.precision),
    }
}

fn ingenieur_f64(x: f64, precision: Option<u8>) -> String {
    let rendu = |m: f64| match precision {
        Some(p) => format!("{:.*}", p as usize, m),
        None => format!("{m}"),
    };

    if x == 0.0 {
        return format!("{}e0", rendu(0.0));
    }

    let signe = if x < 0.0 { "-" } else { "" };
    let abs = x.abs();

    let exp = abs.log10().floor() as i32;
    let mut exp_eng = exp.div_euclid(3) * 3;
    let mut texte = rendu(mantisse(abs, exp_eng));

    // l'arrondi d'affichage peut faire déborder la mantisse (999.99… -> 1000)
    if chiffres_entiers(&texte) > 3 {
        exp_eng += 3;
        texte = rendu(mantisse(abs, exp_eng));
    }

    format!("{signe}{texte}e{exp_eng}")
}

/// abs·10^(-exp). Multiplication pour les exposants négatifs : diviser par
/// un 10^-k déjà arrondi dégrade le dernier bit de la mantisse.
fn mantisse(abs: f64, exp: i32) -> f64 {
    if exp >= 0 {
        abs / 10f64.powi(exp)
    } else {
        abs * 10f64.powi(-exp)
    }
}

/* ------------------------ Exact ------------------------ */

fn formater_exact(r: &BigRational, a: &Affichage) -> String {
    match a.notation {
        Notation::Plain => {
            let texte = match a.precision {
                Some(p) => decimal_arrondi(r, p as usize),
                None => tailler_zeros(&decimal_arrondi(r, DIGITS_DEFAUT)),
            };
            if a.milliers {
                grouper_milliers(&texte)
            } else {
                texte
            }
        }
        Notation::Scientific => exact_exposant(r, a.precision, 1),
        Notation::Engineering => exact_exposant(r, a.precision, 3),
    }
}

/// Écriture décimale de `r` avec `digits` décimales, arrondi demi-éloigné
/// de zéro (aligné sur l'affichage flottant).
fn decimal_arrondi(r: &BigRational, digits: usize) -> String {
    let neg = r.is_negative();
    let abs = r.abs();
    let scale = pow10(digits);

    // floor(|r|·10^d + 1/2) = (2·n·10^d + den) / (2·den)
    let n = abs.numer() * &scale;
    let d = abs.denom();
    let scaled = (BigInt::from(2) * n + d) / (BigInt::from(2) * d);

    scaled_en_decimal(&scaled, digits, neg)
}

/// Entier "scalé" (×10^digits) -> texte décimal, zéro-paddé.
fn scaled_en_decimal(scaled: &BigInt, digits: usize, neg: bool) -> String {
    let scale = pow10(digits);
    let int_part = scaled / &scale;
    let frac_part = scaled % &scale;

    let signe = if neg && !scaled.is_zero() { "-" } else { "" };

    if digits == 0 {
        return format!("{signe}{int_part}");
    }

    let mut frac = frac_part.to_str_radix(10);
    while frac.len() < digits {
        frac.insert(0, '0');
    }

    format!("{signe}{int_part}.{frac}")
}

/// Notation à exposant pour une valeur exacte. `pas` = 1 (scientifique) ou
/// 3 (ingénieur) ; l'exposant affiché est un multiple de `pas`.
fn exact_exposant(r: &BigRational, precision: Option<u8>, pas: i64) -> String {
    let digits = precision.map(|p| p as usize).unwrap_or(DIGITS_DEFAUT);

    if r.is_zero() {
        let mut texte = decimal_arrondi(r, digits);
        if precision.is_none() {
            texte = tailler_zeros(&texte);
        }
        return format!("{texte}e0");
    }

    let neg = r.is_negative();
    let abs = r.abs();

    let mut exp_aff = exposant_decimal(&abs).div_euclid(pas) * pas;
    let mut texte = decimal_arrondi(&decaler(&abs, -exp_aff), digits);

    // même débordement d'arrondi que côté flottant (9.99… -> 10)
    if chiffres_entiers(&texte) > pas as usize {
        exp_aff += pas;
        texte = decimal_arrondi(&decaler(&abs, -exp_aff), digits);
    }

    if precision.is_none() {
        texte = tailler_zeros(&texte);
    }

    let signe = if neg { "-" } else { "" };
    format!("{signe}{texte}e{exp_aff}")
}

/// floor(log10(r)) pour r > 0, par comptage de chiffres (sans flottants).
fn exposant_decimal(r: &BigRational) -> i64 {
    let q = r.to_integer();
    if !q.is_zero() {
        return (q.to_string().len() as i64) - 1;
    }

    // r dans (0, 1) : multiplie par 10 jusqu'à atteindre [1, 10)
    let dix = BigRational::from_integer(BigInt::from(10));
    let un = BigRational::one();
    let mut x = r.clone();
    let mut exp = 0i64;
    while x < un {
        x *= dix.clone();
        exp -= 1;
    }
    exp
}

/// r·10^k (k signé).
fn decaler(r: &BigRational, k: i64) -> BigRational {
    if k >= 0 {
        r * BigRational::from_integer(pow10(k as usize))
    } else {
        r / BigRational::from_integer(pow10((-k) as usize))
    }
}

/* ------------------------ Outils texte ------------------------ */

fn pow10(n: usize) -> BigInt {
    BigInt::from(10).pow(n as u32)
}

/// Chiffres avant le point (signe exclu).
fn chiffres_entiers(texte: &str) -> usize {
    texte
        .trim_start_matches('-')
        .split('.')
        .next()
        .map(|s| s.len())
        .unwrap_or(0)
}

/// Taille les zéros de queue ("0.300000000000" -> "0.3", "5.000" -> "5").
fn tailler_zeros(texte: &str) -> String {
    if !texte.contains('.') {
        return texte.to_string();
    }
    texte
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

/// Groupement ',' de la partie entière ("1234567.5" -> "1,234,567.5").
fn grouper_milliers(texte: &str) -> String {
    let (signe, reste) = match texte.strip_prefix('-') {
        Some(r) => ("-", r),
        None => ("", texte),
    };
    let (ent, frac) = match reste.split_once('.') {
        Some((e, f)) => (e, Some(f)),
        None => (reste, None),
    };

    let n = ent.len();
    let mut groupe = String::with_capacity(n + n / 3);
    for (i, c) in ent.chars().enumerate() {
        if i > 0 && (n - i) % 3 == 0 {
            groupe.push(',');
        }
        groupe.push(c);
    }

    match frac {
        Some(f) => format!("{signe}{groupe}.{f}"),
        None => format!("{signe}{groupe}"),
    }
}
