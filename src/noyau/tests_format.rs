//! Tests affichage : précision, milliers, notations, côté flottant ET côté
//! exact (le rendu exact ne doit jamais transiter par f64).

use num_bigint::BigInt;
use num_rational::BigRational;

use super::eval::Valeur;
use super::format::{formater_valeur, Affichage, Notation};

fn aff(precision: Option<u8>, milliers: bool, notation: Notation) -> Affichage {
    Affichage {
        precision,
        milliers,
        notation,
    }
}

fn flottant(x: f64, a: &Affichage) -> String {
    formater_valeur(&Valeur::Flottant(x), a)
}

fn exact(n: i64, d: i64, a: &Affichage) -> String {
    formater_valeur(
        &Valeur::Exact(BigRational::new(BigInt::from(n), BigInt::from(d))),
        a,
    )
}

/* ------------------------ Flottant, notation simple ------------------------ */

#[test]
fn flottant_simple() {
    let a = Affichage::default();
    assert_eq!(flottant(5.0, &a), "5");
    assert_eq!(flottant(-2.5, &a), "-2.5");
}

#[test]
fn flottant_precision_fixe() {
    let a = aff(Some(2), false, Notation::Plain);
    assert_eq!(flottant(5.0, &a), "5.00");
    assert_eq!(flottant(2.567, &a), "2.57");
    let a0 = aff(Some(0), false, Notation::Plain);
    assert_eq!(flottant(2.6, &a0), "3");
}

#[test]
fn flottant_milliers() {
    let a = aff(None, true, Notation::Plain);
    assert_eq!(flottant(1234567.5, &a), "1,234,567.5");
    assert_eq!(flottant(123.0, &a), "123");
    let a0 = aff(Some(0), true, Notation::Plain);
    assert_eq!(flottant(-1234567.0, &a0), "-1,234,567");
}

/* ------------------------ Flottant, notations à exposant ------------------------ */

#[test]
fn flottant_scientifique() {
    assert_eq!(flottant(1500.0, &aff(None, false, Notation::Scientific)), "1.5e3");
    assert_eq!(
        flottant(1500.0, &aff(Some(2), false, Notation::Scientific)),
        "1.50e3"
    );
    assert_eq!(flottant(0.05, &aff(None, false, Notation::Scientific)), "5e-2");
}

#[test]
fn flottant_ingenieur() {
    let a = aff(None, false, Notation::Engineering);
    // exposant multiple de 3, mantisse dans [1, 1000)
    assert_eq!(flottant(1500.0, &a), "1.5e3");
    assert_eq!(flottant(0.05, &a), "50e-3");
    assert_eq!(flottant(1.0, &a), "1e0");
    assert_eq!(flottant(-25000000.0, &a), "-25e6");
}

#[test]
fn flottant_ingenieur_debordement_d_arrondi() {
    // 999.999 arrondi à une décimale déborde la mantisse : l'exposant suit
    let a = aff(Some(1), false, Notation::Engineering);
    assert_eq!(flottant(999999.0, &a), "1.0e6");
}

#[test]
fn non_fini_rendu_direct() {
    for notation in [Notation::Plain, Notation::Scientific, Notation::Engineering] {
        let a = aff(Some(3), true, notation);
        assert_eq!(flottant(f64::NAN, &a), "NaN");
        assert_eq!(flottant(f64::INFINITY, &a), "inf");
        assert_eq!(flottant(f64::NEG_INFINITY, &a), "-inf");
    }
}

/* ------------------------ Exact ------------------------ */

#[test]
fn exact_simple() {
    let a = Affichage::default();
    // précision off : zéros de queue taillés
    assert_eq!(exact(3, 10, &a), "0.3");
    assert_eq!(exact(5, 1, &a), "5");
    assert_eq!(exact(0, 1, &a), "0");
    // 1/3 n'a pas d'écriture finie : douze décimales par défaut
    assert_eq!(exact(1, 3, &a), "0.333333333333");
}

#[test]
fn exact_precision_fixe() {
    assert_eq!(exact(-1, 8, &aff(Some(3), false, Notation::Plain)), "-0.125");
    // demi-éloigné de zéro, comme côté flottant
    assert_eq!(exact(1, 8, &aff(Some(2), false, Notation::Plain)), "0.13");
    assert_eq!(exact(3, 2, &aff(Some(0), false, Notation::Plain)), "2");
    assert_eq!(exact(-3, 2, &aff(Some(0), false, Notation::Plain)), "-2");
    assert_eq!(exact(1, 2, &aff(Some(4), false, Notation::Plain)), "0.5000");
}

#[test]
fn exact_milliers() {
    let a = aff(None, true, Notation::Plain);
    assert_eq!(exact(12345678, 10, &a), "1,234,567.8");
    assert_eq!(exact(-1234567, 1, &a), "-1,234,567");
}

#[test]
fn exact_notations_a_exposant() {
    assert_eq!(exact(1500, 1, &aff(None, false, Notation::Scientific)), "1.5e3");
    assert_eq!(exact(1, 400, &aff(None, false, Notation::Scientific)), "2.5e-3");
    assert_eq!(exact(1500, 1, &aff(None, false, Notation::Engineering)), "1.5e3");
    assert_eq!(exact(1, 20, &aff(None, false, Notation::Engineering)), "50e-3");
    assert_eq!(
        exact(1500, 1, &aff(Some(2), false, Notation::Scientific)),
        "1.50e3"
    );
    assert_eq!(exact(0, 1, &aff(None, false, Notation::Scientific)), "0e0");
}

#[test]
fn exact_exposant_debordement_d_arrondi() {
    // 9999/1000 = 9.999 : à deux décimales l'arrondi donne 10.00, donc
    // l'exposant monte d'un cran
    assert_eq!(
        exact(9999, 1000, &aff(Some(2), false, Notation::Scientific)),
        "1.00e1"
    );
}
