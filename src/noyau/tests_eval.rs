//! Tests évaluation : arithmétique des deux backends, résolution de
//! symboles à trois étages, erreurs métier.

use std::collections::HashMap;

use num_bigint::BigInt;
use num_rational::BigRational;

use super::eval::{evaluer, ErreurEval, Mode, TableSymboles, Valeur};
use super::rpn::parser;
use super::valide::valider;

fn rat(n: i64, d: i64) -> BigRational {
    BigRational::new(BigInt::from(n), BigInt::from(d))
}

/// Évalue en mode flottant, table vide (constantes actives).
fn eval_f(src: &str) -> Result<f64, ErreurEval> {
    let vars = HashMap::new();
    let sym = TableSymboles::new(None, 0.0, &vars, true);
    eval_f_avec(src, &sym)
}

fn eval_f_avec(src: &str, sym: &TableSymboles<'_>) -> Result<f64, ErreurEval> {
    let expr = parser(src).unwrap_or_else(|e| panic!("src={src:?} err={e}"));
    valider(&expr).unwrap_or_else(|e| panic!("src={src:?} err={e}"));
    match evaluer(&expr, sym, Mode::Flottant)? {
        Valeur::Flottant(v) => Ok(v),
        Valeur::Exact(_) => panic!("backend flottant attendu pour {src:?}"),
    }
}

/// Évalue en mode décimal exact, table vide (constantes coupées).
fn eval_d(src: &str) -> Result<BigRational, ErreurEval> {
    let vars = HashMap::new();
    let sym = TableSymboles::new(None, 0.0, &vars, false);
    let expr = parser(src).unwrap_or_else(|e| panic!("src={src:?} err={e}"));
    valider(&expr).unwrap_or_else(|e| panic!("src={src:?} err={e}"));
    match evaluer(&expr, &sym, Mode::Decimal)? {
        Valeur::Exact(r) => Ok(r),
        Valeur::Flottant(_) => panic!("backend décimal attendu pour {src:?}"),
    }
}

fn ok_f(src: &str) -> f64 {
    eval_f(src).unwrap_or_else(|e| panic!("src={src:?} err={e}"))
}

fn ok_d(src: &str) -> BigRational {
    eval_d(src).unwrap_or_else(|e| panic!("src={src:?} err={e}"))
}

/* ------------------------ Arithmétique flottante ------------------------ */

#[test]
fn arithmetique_de_base() {
    assert_eq!(ok_f("2+3*4"), 14.0);
    assert_eq!(ok_f("(2+3)*4"), 20.0);
    assert_eq!(ok_f("2**3**2"), 512.0);
    assert_eq!(ok_f("10-3-2"), 5.0);
    assert_eq!(ok_f("2**-2"), 0.25);
}

#[test]
fn unaire_avant_puissance() {
    assert_eq!(ok_f("-2**2"), 4.0);
    assert_eq!(ok_f("-(2**2)"), -4.0);
}

#[test]
fn reste_et_division_plancher() {
    assert_eq!(ok_f("7//2"), 3.0);
    assert_eq!(ok_f("7%3"), 1.0);
    // convention plancher : le reste prend le signe du diviseur
    assert_eq!(ok_f("7 % -3"), -2.0);
    assert_eq!(ok_f("-7 % 3"), 2.0);
    assert_eq!(ok_f("-7 // 2"), -4.0);
    assert_eq!(ok_f("7.5 // 2"), 3.0);
}

#[test]
fn division_par_zero_erreur_metier() {
    for src in ["1/0", "5%0", "3//0", "1/(2-2)"] {
        assert_eq!(eval_f(src), Err(ErreurEval::DivisionParZero), "src={src:?}");
    }
}

/* ------------------------ Fonctions (flottant seulement) ------------------------ */

#[test]
fn fonctions_de_la_liste_blanche() {
    assert_eq!(ok_f("sqrt(16)"), 4.0);
    assert_eq!(ok_f("abs(-3)"), 3.0);
    assert_eq!(ok_f("exp(0)"), 1.0);
    assert_eq!(ok_f("sin(0)"), 0.0);
    assert_eq!(ok_f("cos(0)"), 1.0);
    assert!((ok_f("log(e)") - 1.0).abs() < 1e-12);
    assert!((ok_f("log10(1000)") - 3.0).abs() < 1e-12);
    assert!((ok_f("tan(pi/4)") - 1.0).abs() < 1e-12);
}

#[test]
fn round_une_ou_deux_arites() {
    assert_eq!(ok_f("round(2.567, 2)"), 2.57);
    assert_eq!(ok_f("round(2.4)"), 2.0);
    // demi-éloigné de zéro
    assert_eq!(ok_f("round(2.5)"), 3.0);
    assert_eq!(ok_f("round(-2.5)"), -3.0);
    // décimales négatives : dizaines, centaines
    assert_eq!(ok_f("round(1234.5, -2)"), 1200.0);
    // 2e argument tronqué vers un entier
    assert_eq!(ok_f("round(2.567, 2.9)"), 2.57);
}

#[test]
fn constantes_en_mode_flottant() {
    assert_eq!(ok_f("pi"), std::f64::consts::PI);
    assert_eq!(ok_f("e"), std::f64::consts::E);
}

/* ------------------------ Résolution de symboles ------------------------ */

#[test]
fn trois_etages_de_priorite() {
    let mut vars = HashMap::new();
    vars.insert("x".to_string(), 7.0);
    // un utilisateur PEUT éclipser une constante…
    vars.insert("pi".to_string(), 3.0);
    // …mais jamais un réservé (la session l'empêche ; la table aussi)
    vars.insert("ans".to_string(), 99.0);

    let sym = TableSymboles::new(Some(5.0), 2.5, &vars, true);
    assert_eq!(eval_f_avec("x*2", &sym), Ok(14.0));
    assert_eq!(eval_f_avec("pi", &sym), Ok(3.0));
    assert_eq!(eval_f_avec("ans", &sym), Ok(5.0));
    assert_eq!(eval_f_avec("mem", &sym), Ok(2.5));
    assert_eq!(eval_f_avec("ans*2+mem", &sym), Ok(12.5));
}

#[test]
fn identifiant_inconnu() {
    assert_eq!(
        eval_f("zz+1"),
        Err(ErreurEval::IdentifiantInconnu("zz".into()))
    );
}

#[test]
fn ans_absent_tant_que_rien_n_est_calcule() {
    let vars = HashMap::new();
    let sym = TableSymboles::new(None, 0.0, &vars, true);
    assert_eq!(
        eval_f_avec("ans+1", &sym),
        Err(ErreurEval::IdentifiantInconnu("ans".into()))
    );
}

#[test]
fn constantes_coupees_en_mode_decimal() {
    assert_eq!(
        eval_d("pi"),
        Err(ErreurEval::IdentifiantInconnu("pi".into()))
    );
}

/* ------------------------ Backend décimal exact ------------------------ */

#[test]
fn litteraux_exacts_depuis_le_texte() {
    // 0.1 vaut exactement 1/10, pas le flottant binaire voisin
    assert_eq!(ok_d("0.1"), rat(1, 10));
    assert_eq!(ok_d("0.1+0.2"), rat(3, 10));
    assert_eq!(ok_d("0.1*3"), rat(3, 10));
    assert_eq!(ok_d(".5"), rat(1, 2));
    assert_eq!(ok_d("1/3"), rat(1, 3));
}

#[test]
fn operateurs_decimaux() {
    assert_eq!(ok_d("7%3"), rat(1, 1));
    assert_eq!(ok_d("7.5%2"), rat(3, 2));
    assert_eq!(ok_d("7.5//2"), rat(3, 1));
    assert_eq!(ok_d("-7//2"), rat(-4, 1));
    assert_eq!(ok_d("2**10"), rat(1024, 1));
    assert_eq!(ok_d("2**0"), rat(1, 1));
    assert_eq!(ok_d("1.5**2"), rat(9, 4));
}

#[test]
fn division_par_zero_decimale() {
    for src in ["1/0", "5%0", "3//0"] {
        assert_eq!(eval_d(src), Err(ErreurEval::DivisionParZero), "src={src:?}");
    }
}

#[test]
fn fonctions_refusees_en_decimal() {
    assert_eq!(eval_d("sqrt(4)"), Err(ErreurEval::FonctionsIndisponibles));
    // refusé avant d'évaluer les arguments : même un argument fautif ne
    // change pas l'erreur
    assert_eq!(eval_d("sqrt(1/0)"), Err(ErreurEval::FonctionsIndisponibles));
}

#[test]
fn puissances_hors_domaine_decimal() {
    assert!(matches!(
        eval_d("2**-1"),
        Err(ErreurEval::OperationNonSupportee(_))
    ));
    assert!(matches!(
        eval_d("4**0.5"),
        Err(ErreurEval::OperationNonSupportee(_))
    ));
    assert!(matches!(
        eval_d("2**100000000"),
        Err(ErreurEval::OperationNonSupportee(_))
    ));
}

#[test]
fn symboles_f64_repris_exactement_en_decimal() {
    let vars = HashMap::new();
    // 0.5 est exact en binaire : ans vaut exactement 1/2
    let sym = TableSymboles::new(Some(0.5), 0.0, &vars, false);
    let expr = parser("ans+0.5").expect("parse");
    valider(&expr).expect("valide");
    assert_eq!(
        evaluer(&expr, &sym, Mode::Decimal),
        Ok(Valeur::Exact(rat(1, 1)))
    );
}

#[test]
fn comme_f64_rejoint_le_flottant() {
    assert_eq!(Valeur::Exact(rat(3, 10)).comme_f64(), 0.3);
    assert_eq!(Valeur::Flottant(1.5).comme_f64(), 1.5);
}
