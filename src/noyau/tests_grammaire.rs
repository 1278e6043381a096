//! Tests grammaire : priorités, associativité, erreurs positionnées.
//!
//! L'affichage Debug de l'AST est entièrement parenthésé : on s'en sert
//! pour vérifier la STRUCTURE des arbres, pas seulement leurs valeurs.

use super::expr::Expr;
use super::jetons::tokenize;
use super::rpn::parser;
use super::valide::{valider, ErreurValidation};

fn arbre(src: &str) -> String {
    parser(src)
        .unwrap_or_else(|e| panic!("src={src:?} err={e}"))
        .to_string()
}

fn erreur(src: &str) -> (usize, String) {
    let e = parser(src).expect_err("aurait dû échouer");
    (e.pos, e.raison)
}

/* ------------------------ Priorités et associativité ------------------------ */

#[test]
fn somme_et_produit() {
    assert_eq!(arbre("2+3*4"), "(2+(3*4))");
    assert_eq!(arbre("(2+3)*4"), "((2+3)*4)");
    assert_eq!(arbre("2*3+4"), "((2*3)+4)");
}

#[test]
fn puissance_associative_a_droite() {
    assert_eq!(arbre("2**3**2"), "(2**(3**2))");
    assert_eq!(arbre("(2**3)**2"), "((2**3)**2)");
}

#[test]
fn gauche_associatif_meme_etage() {
    assert_eq!(arbre("10-3-2"), "((10-3)-2)");
    assert_eq!(arbre("7//2%3"), "((7//2)%3)");
    assert_eq!(arbre("8/2*4"), "((8/2)*4)");
}

#[test]
fn unaire_plus_fort_que_puissance() {
    // le préfixe lie plus fort que ** : -2**2 == (-2)**2
    assert_eq!(arbre("-2**2"), "((-2)**2)");
    assert_eq!(arbre("2**-3"), "(2**(-3))");
    assert_eq!(arbre("-2+3"), "((-2)+3)");
}

#[test]
fn unaires_chaines() {
    assert_eq!(arbre("--2"), "(-(-2))");
    assert_eq!(arbre("+-2"), "(+(-2))");
    assert_eq!(arbre("2--3"), "(2-(-3))");
}

#[test]
fn appels_de_fonction() {
    assert_eq!(arbre("sqrt(4)"), "sqrt(4)");
    assert_eq!(arbre("round(2.567, 2)"), "round(2.567, 2)");
    assert_eq!(arbre("sqrt(abs(-4))"), "sqrt(abs((-4)))");
    assert_eq!(arbre("round(1+2, 2*1)"), "round((1+2), (2*1))");
}

#[test]
fn casse_insensible_et_espaces() {
    assert_eq!(arbre("SQRT(4)"), "sqrt(4)");
    assert_eq!(arbre("Ans + PI"), "(ans+pi)");
    assert_eq!(arbre("  2   +3 "), "(2+3)");
}

#[test]
fn litteraux_decimaux() {
    assert_eq!(arbre(".5+1.25"), "(.5+1.25)");
    assert_eq!(arbre("0.1"), "0.1");
}

/* ------------------------ Erreurs, avec positions ------------------------ */

#[test]
fn caracteres_hors_liste_blanche() {
    assert_eq!(erreur("[1]").0, 0);
    assert_eq!(erreur("2 @ 3").0, 2);
    assert_eq!(erreur("\"x\"").0, 0);
    // '=' n'existe pas dans la grammaire d'expression
    assert_eq!(erreur("2 = 3").0, 2);
}

#[test]
fn points_orphelins() {
    // accès attribut et double point refusés au lexeur
    assert_eq!(erreur("a.b").0, 1);
    assert_eq!(erreur("1.2.3").0, 3);
    assert_eq!(erreur("1.").0, 1);
}

#[test]
fn parentheses() {
    let (pos, raison) = erreur("(2+3");
    assert_eq!(pos, 0);
    assert!(raison.contains("non fermée"), "raison={raison}");

    let (pos, raison) = erreur("2+3)");
    assert_eq!(pos, 3);
    assert!(raison.contains("sans ouvrante"), "raison={raison}");

    assert_eq!(erreur("()").0, 1);
}

#[test]
fn expressions_tronquees() {
    assert_eq!(erreur("2+").0, 2);
    assert_eq!(erreur("*2").0, 0);
    assert_eq!(erreur("").0, 0);
}

#[test]
fn juxtapositions() {
    assert_eq!(erreur("2 3").0, 2);
    assert_eq!(erreur("2(3)").0, 1);
    assert_eq!(erreur("1 e5").0, 2);
}

#[test]
fn virgules() {
    let (pos, raison) = erreur("1, 2");
    assert_eq!(pos, 1);
    assert!(raison.contains("virgule"), "raison={raison}");

    assert_eq!(erreur("sqrt(, 2)").0, 5);
    assert_eq!(erreur("round(2,)").0, 8);
}

#[test]
fn fonction_inconnue_au_parseur() {
    let (pos, raison) = erreur("machin(2)");
    assert_eq!(pos, 0);
    assert!(raison.contains("fonction inconnue"), "raison={raison}");
}

#[test]
fn tokenize_vide_ok() {
    // l'entrée vide est un no-op en amont ; le lexeur, lui, l'accepte
    assert!(tokenize("").expect("lexeur").is_empty());
    assert!(tokenize("   ").expect("lexeur").is_empty());
}

/* ------------------------ Validation (ceinture et bretelles) ------------------------ */

#[test]
fn arite_verifiee() {
    let expr = parser("sqrt(1, 2)").expect("parse");
    assert!(matches!(
        valider(&expr),
        Err(ErreurValidation::AriteInvalide { .. })
    ));

    let expr = parser("round(1, 2, 3)").expect("parse");
    assert!(matches!(
        valider(&expr),
        Err(ErreurValidation::AriteInvalide { .. })
    ));

    assert!(valider(&parser("round(1)").expect("parse")).is_ok());
    assert!(valider(&parser("round(1, 2)").expect("parse")).is_ok());
    assert!(valider(&parser("sqrt(4)").expect("parse")).is_ok());
}

#[test]
fn appel_hors_liste_refuse_meme_construit_a_la_main() {
    // le parseur refuse déjà "machin(2)" ; un arbre construit par du code
    // doit l'être aussi (la liste blanche vit à UN endroit)
    let expr = Expr::Appel("machin".into(), vec![Expr::Nombre("2".into())]);
    assert!(matches!(
        valider(&expr),
        Err(ErreurValidation::FonctionInconnue(nom)) if nom == "machin"
    ));
}

#[test]
fn validation_recursive_dans_les_arguments() {
    let expr = Expr::Binaire(
        super::expr::OpBinaire::Add,
        Box::new(Expr::Nombre("1".into())),
        Box::new(Expr::Appel("machin".into(), vec![Expr::Nombre("2".into())])),
    );
    assert!(valider(&expr).is_err());
}
