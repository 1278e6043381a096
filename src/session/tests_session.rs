//! Tests session : invariants du journal, annuler/rétablir, mémoire,
//! réservés, préférences. Chaque test part d'un état frais : aucune
//! session globale, c'est le but.

use crate::noyau::eval::ErreurEval;
use crate::noyau::Notation;

use super::etat::{ErreurLigne, ErreurSession, EtatSession, Sortie, HISTORIQUE_MAX};

fn session() -> EtatSession {
    EtatSession::new()
}

/// Évalue une ligne censée réussir.
fn ligne(etat: &mut EtatSession, texte: &str) -> Sortie {
    etat.evaluer_ligne(texte)
        .unwrap_or_else(|e| panic!("ligne={texte:?} err={e}"))
}

/* ------------------------ Lignes et journal ------------------------ */

#[test]
fn ligne_blanche_no_op() {
    let mut s = session();
    assert_eq!(ligne(&mut s, "   "), Sortie::Ignoree);
    assert_eq!(ligne(&mut s, ""), Sortie::Ignoree);
    assert!(s.historique().is_empty());
    assert_eq!(s.dernier(), None);
}

#[test]
fn evaluation_avance_ans_et_journal() {
    let mut s = session();
    assert!(matches!(ligne(&mut s, "2+3"), Sortie::Evaluee(_)));
    assert_eq!(s.dernier(), Some(5.0));
    assert_eq!(s.historique().len(), 1);
    assert_eq!(s.historique()[0].texte, "2+3");
    assert_eq!(s.historique()[0].resultat, Some(5.0));

    // ans circule dans la ligne suivante
    ligne(&mut s, "ans*2");
    assert_eq!(s.dernier(), Some(10.0));
}

#[test]
fn erreur_de_syntaxe_ne_change_rien() {
    let mut s = session();
    ligne(&mut s, "1+1");
    let avant = s.historique().len();

    assert!(matches!(
        s.evaluer_ligne("2+*3"),
        Err(ErreurLigne::Syntaxe(_))
    ));
    assert_eq!(s.historique().len(), avant);
    assert_eq!(s.dernier(), Some(2.0));
}

#[test]
fn borne_du_journal() {
    let mut s = session();
    for _ in 0..(HISTORIQUE_MAX + 5) {
        ligne(&mut s, "1+1");
    }
    assert_eq!(s.historique().len(), HISTORIQUE_MAX);
}

/* ------------------------ Affectations ------------------------ */

#[test]
fn affectation_puis_usage() {
    let mut s = session();
    match ligne(&mut s, "x = 2+3") {
        Sortie::Affectee { nom, .. } => assert_eq!(nom, "x"),
        autre => panic!("issue inattendue: {autre:?}"),
    }
    assert_eq!(s.vars()["x"], 5.0);

    // l'affectation ne touche ni journal ni ans
    assert!(s.historique().is_empty());
    assert_eq!(s.dernier(), None);

    ligne(&mut s, "x*2");
    assert_eq!(s.dernier(), Some(10.0));
}

#[test]
fn affectation_casse_insensible() {
    let mut s = session();
    ligne(&mut s, "Total = 4");
    assert_eq!(s.vars()["total"], 4.0);
    ligne(&mut s, "TOTAL + 1");
    assert_eq!(s.dernier(), Some(5.0));
}

#[test]
fn reserves_refuses_sans_toucher_les_vars() {
    let mut s = session();
    assert!(matches!(
        s.evaluer_ligne("ans = 1"),
        Err(ErreurLigne::NomReserve(nom)) if nom == "ans"
    ));
    assert!(matches!(
        s.evaluer_ligne("MEM = 2"),
        Err(ErreurLigne::NomReserve(nom)) if nom == "mem"
    ));
    assert!(s.vars().is_empty());
    assert!(s.historique().is_empty());
}

#[test]
fn reserve_verifie_avant_l_evaluation() {
    // la droite n'est même pas évaluée : c'est le nom qui est refusé
    let mut s = session();
    assert!(matches!(
        s.evaluer_ligne("ans = 1/0"),
        Err(ErreurLigne::NomReserve(_))
    ));
}

#[test]
fn division_par_zero_dans_une_affectation_ne_lie_rien() {
    let mut s = session();
    assert!(matches!(
        s.evaluer_ligne("x = 1/0"),
        Err(ErreurLigne::Eval(ErreurEval::DivisionParZero))
    ));
    assert!(s.vars().is_empty());
    assert!(s.historique().is_empty());
}

#[test]
fn position_d_erreur_relative_a_la_ligne_entiere() {
    let mut s = session();
    match s.evaluer_ligne("x = 2+*3") {
        Err(ErreurLigne::Syntaxe(e)) => assert_eq!(e.pos, 6),
        autre => panic!("issue inattendue: {autre:?}"),
    }
}

/* ------------------------ Division par zéro (expression) ------------------------ */

#[test]
fn indefini_consigne_sans_avancer_ans() {
    let mut s = session();
    ligne(&mut s, "4*2");
    assert_eq!(s.dernier(), Some(8.0));

    assert_eq!(ligne(&mut s, "1/0"), Sortie::Indefinie);
    // la tentative est au journal, résultat indéfini…
    assert_eq!(s.historique().len(), 2);
    assert_eq!(s.historique()[1].resultat, None);
    // …mais ans n'a pas bougé
    assert_eq!(s.dernier(), Some(8.0));

    // annuler retire la tentative indéfinie
    let e = s.annuler().expect("annuler");
    assert_eq!(e.resultat, None);
    assert_eq!(s.dernier(), Some(8.0));
    assert_eq!(s.historique().len(), 1);
}

/* ------------------------ Annuler / rétablir ------------------------ */

#[test]
fn annuler_retablir_inverses() {
    let mut s = session();
    ligne(&mut s, "1+1");
    ligne(&mut s, "2+2");

    let annulee = s.annuler().expect("annuler");
    assert_eq!(annulee.texte, "2+2");
    assert_eq!(s.dernier(), Some(2.0));
    assert_eq!(s.refaire_disponibles(), 1);

    let retablie = s.retablir().expect("rétablir");
    assert_eq!(retablie.texte, "2+2");
    assert_eq!(s.dernier(), Some(4.0));
    assert_eq!(s.historique().len(), 2);
    assert_eq!(s.refaire_disponibles(), 0);
}

#[test]
fn annuler_jusqu_a_epuisement() {
    let mut s = session();
    ligne(&mut s, "1+1");
    s.annuler().expect("annuler");
    assert_eq!(s.dernier(), None);

    // idempotent une fois vide : même erreur, état inchangé
    assert_eq!(s.annuler(), Err(ErreurSession::HistoriqueVide));
    assert_eq!(s.annuler(), Err(ErreurSession::HistoriqueVide));
    assert_eq!(s.dernier(), None);
    assert_eq!(s.refaire_disponibles(), 1);
}

#[test]
fn retablir_sans_rien_a_rejouer() {
    let mut s = session();
    assert_eq!(s.retablir(), Err(ErreurSession::RefaireVide));
    ligne(&mut s, "1+1");
    assert_eq!(s.retablir(), Err(ErreurSession::RefaireVide));
}

#[test]
fn nouvelle_evaluation_vide_la_pile_refaire() {
    let mut s = session();
    ligne(&mut s, "1+1");
    ligne(&mut s, "2+2");
    s.annuler().expect("annuler");
    assert_eq!(s.refaire_disponibles(), 1);

    ligne(&mut s, "5*5");
    assert_eq!(s.refaire_disponibles(), 0);
    assert_eq!(s.retablir(), Err(ErreurSession::RefaireVide));
}

#[test]
fn indefini_consigne_vide_aussi_la_pile_refaire() {
    let mut s = session();
    ligne(&mut s, "1+1");
    ligne(&mut s, "2+2");
    s.annuler().expect("annuler");
    assert_eq!(s.refaire_disponibles(), 1);

    // l'entrée "indéfini" est un ajout au journal comme un autre
    assert_eq!(ligne(&mut s, "1/0"), Sortie::Indefinie);
    assert_eq!(s.refaire_disponibles(), 0);
}

#[test]
fn annuler_sur_sommet_indefini_recale_ans_sur_le_sommet() {
    let mut s = session();
    ligne(&mut s, "2+3");
    ligne(&mut s, "1/0");
    ligne(&mut s, "10*2");
    assert_eq!(s.dernier(), Some(20.0));

    // le nouveau sommet est l'entrée indéfinie : ans devient non défini,
    // pas de saut d'entrées
    s.annuler().expect("annuler");
    assert_eq!(s.dernier(), None);

    s.annuler().expect("annuler");
    assert_eq!(s.dernier(), Some(5.0));
}

#[test]
fn retablir_un_indefini_laisse_ans_en_place() {
    let mut s = session();
    ligne(&mut s, "2+3");
    ligne(&mut s, "1/0");
    assert_eq!(s.dernier(), Some(5.0));

    s.annuler().expect("annuler");
    assert_eq!(s.dernier(), Some(5.0));

    // rejouer l'indéfini n'avance pas ans : annuler∘rétablir est neutre
    s.retablir().expect("rétablir");
    assert_eq!(s.dernier(), Some(5.0));
    assert_eq!(s.historique().len(), 2);
}

/* ------------------------ Mémoire ------------------------ */

#[test]
fn memoire_sans_resultat_prealable() {
    let mut s = session();
    assert_eq!(s.memoire_ajouter(), Err(ErreurSession::AucunResultat));
    assert_eq!(s.memoire_soustraire(), Err(ErreurSession::AucunResultat));
    assert_eq!(s.memoire_rappel(), 0.0);
}

#[test]
fn memoire_accumule_ans() {
    let mut s = session();
    ligne(&mut s, "6*7");
    assert_eq!(s.memoire_ajouter(), Ok(42.0));
    assert_eq!(s.memoire_ajouter(), Ok(84.0));

    ligne(&mut s, "2");
    assert_eq!(s.memoire_soustraire(), Ok(82.0));
    assert_eq!(s.memoire_rappel(), 82.0);

    // mem circule dans les expressions
    ligne(&mut s, "mem+1");
    assert_eq!(s.dernier(), Some(83.0));
}

#[test]
fn ans_inconnu_avant_tout_calcul() {
    let mut s = session();
    assert!(matches!(
        s.evaluer_ligne("ans+1"),
        Err(ErreurLigne::Eval(ErreurEval::IdentifiantInconnu(nom))) if nom == "ans"
    ));
}

/* ------------------------ Préférences ------------------------ */

#[test]
fn precision_bornee() {
    let mut s = session();
    assert_eq!(
        s.fixer_precision(Some(13)),
        Err(ErreurSession::PrecisionHorsPlage(13))
    );
    assert_eq!(
        s.fixer_precision(Some(-1)),
        Err(ErreurSession::PrecisionHorsPlage(-1))
    );
    assert_eq!(s.precision(), None);

    s.fixer_precision(Some(0)).expect("0 est valide");
    assert_eq!(s.precision(), Some(0));
    s.fixer_precision(Some(12)).expect("12 est valide");
    assert_eq!(s.precision(), Some(12));
    s.fixer_precision(None).expect("off est valide");
    assert_eq!(s.precision(), None);
}

#[test]
fn formatage_selon_les_preferences() {
    let mut s = session();
    s.fixer_precision(Some(2)).expect("précision");
    match ligne(&mut s, "2.5*2") {
        Sortie::Evaluee(v) => assert_eq!(s.formater(&v), "5.00"),
        autre => panic!("issue inattendue: {autre:?}"),
    }

    s.fixer_milliers(true);
    s.fixer_precision(None).expect("off");
    match ligne(&mut s, "1000000+234567") {
        Sortie::Evaluee(v) => assert_eq!(s.formater(&v), "1,234,567"),
        autre => panic!("issue inattendue: {autre:?}"),
    }

    s.fixer_milliers(false);
    s.fixer_notation(Notation::Scientific);
    match ligne(&mut s, "1500") {
        Sortie::Evaluee(v) => assert_eq!(s.formater(&v), "1.5e3"),
        autre => panic!("issue inattendue: {autre:?}"),
    }
}

/* ------------------------ Mode décimal ------------------------ */

#[test]
fn mode_decimal_exact_de_bout_en_bout() {
    let mut s = session();
    s.fixer_mode_decimal(true);

    match ligne(&mut s, "0.1+0.2") {
        Sortie::Evaluee(v) => assert_eq!(s.formater(&v), "0.3"),
        autre => panic!("issue inattendue: {autre:?}"),
    }
    assert_eq!(s.dernier(), Some(0.3));
}

#[test]
fn fonctions_refusees_en_decimal_sans_toucher_l_etat() {
    let mut s = session();
    ligne(&mut s, "2+3");
    s.fixer_mode_decimal(true);

    assert!(matches!(
        s.evaluer_ligne("sqrt(4)"),
        Err(ErreurLigne::Eval(ErreurEval::FonctionsIndisponibles))
    ));
    assert_eq!(s.historique().len(), 1);
    assert_eq!(s.dernier(), Some(5.0));

    // retour au flottant : la même ligne passe
    s.fixer_mode_decimal(false);
    ligne(&mut s, "sqrt(4)");
    assert_eq!(s.dernier(), Some(2.0));
}
