//! Tests persistance : aller-retour disque, formes héritées, défauts sûrs,
//! garde-fous non-finis. Les décodages purs passent par charger_texte ;
//! l'I/O réelle par des fichiers temporaires jetables.

use std::fs;
use std::path::PathBuf;

use crate::noyau::Notation;

use super::etat::EtatSession;
use super::persistance::{charger, charger_texte, sauver, ErreurPersistance};

fn chemin_temp(nom: &str) -> PathBuf {
    let mut p = std::env::temp_dir();
    p.push(format!(
        "calculatrice-session-test-{}-{nom}.json",
        std::process::id()
    ));
    p
}

fn ligne(etat: &mut EtatSession, texte: &str) {
    etat.evaluer_ligne(texte)
        .unwrap_or_else(|e| panic!("ligne={texte:?} err={e}"));
}

/* ------------------------ Aller-retour ------------------------ */

#[test]
fn aller_retour_complet() {
    let mut s = EtatSession::new();
    ligne(&mut s, "x = 2+3");
    ligne(&mut s, "x*2");
    ligne(&mut s, "1/0");
    ligne(&mut s, "7//2");
    s.memoire_ajouter().expect("m+");
    s.fixer_precision(Some(4)).expect("précision");
    s.fixer_milliers(true);
    s.fixer_notation(Notation::Scientific);

    // une annulation pour peupler la pile refaire avant l'enregistrement
    s.annuler().expect("annuler");
    assert_eq!(s.refaire_disponibles(), 1);

    let chemin = chemin_temp("aller-retour");
    sauver(&s, &chemin).expect("sauver");
    let r = charger(&chemin).expect("charger");
    let _ = fs::remove_file(&chemin);

    assert_eq!(r.memoire_rappel(), s.memoire_rappel());
    assert_eq!(r.vars(), s.vars());
    assert_eq!(r.mode_decimal(), s.mode_decimal());
    assert_eq!(r.milliers(), s.milliers());
    assert_eq!(r.notation(), s.notation());
    assert_eq!(r.precision(), s.precision());

    // même journal (textes + résultats ; les horodatages ne sont pas persistés)
    let textes = |e: &EtatSession| -> Vec<(String, Option<f64>)> {
        e.historique()
            .iter()
            .map(|x| (x.texte.clone(), x.resultat))
            .collect()
    };
    assert_eq!(textes(&r), textes(&s));

    // la pile refaire n'est JAMAIS persistée
    assert_eq!(r.refaire_disponibles(), 0);

    // ans recalculé depuis le sommet du journal
    assert_eq!(r.dernier(), s.historique().last().and_then(|e| e.resultat));
}

#[test]
fn resultat_indefini_persiste_en_null() {
    let mut s = EtatSession::new();
    ligne(&mut s, "1/0");

    let chemin = chemin_temp("indefini");
    sauver(&s, &chemin).expect("sauver");
    let texte = fs::read_to_string(&chemin).expect("lire");
    assert!(texte.contains("null"), "texte={texte}");

    let r = charger(&chemin).expect("charger");
    let _ = fs::remove_file(&chemin);
    assert_eq!(r.historique()[0].resultat, None);
    // le sommet est indéfini : ans ne renaît pas du fichier
    assert_eq!(r.dernier(), None);
}

#[test]
fn notation_ecrite_en_toutes_lettres() {
    let mut s = EtatSession::new();
    s.fixer_notation(Notation::Engineering);

    let chemin = chemin_temp("notation");
    sauver(&s, &chemin).expect("sauver");
    let texte = fs::read_to_string(&chemin).expect("lire");
    let _ = fs::remove_file(&chemin);

    assert!(texte.contains("\"engineering\""), "texte={texte}");
    assert!(texte.contains("\"format_notation\""), "texte={texte}");
}

/* ------------------------ Forme héritée ------------------------ */

#[test]
fn entrees_heritees_normalisees() {
    let r = charger_texte(
        r#"{
            "memory": 2.5,
            "vars": {"X": 1.5},
            "decimal": false,
            "format_thousands": true,
            "format_notation": "engineering",
            "precision": 4,
            "history": [
                {"op": "+", "a": 2, "b": 3, "result": 5},
                {"op": "/", "a": 1, "b": 0, "result": null},
                {"expr": "5 * 2", "result": 10.0}
            ]
        }"#,
    )
    .expect("charger_texte");

    assert_eq!(r.memoire_rappel(), 2.5);
    assert_eq!(r.vars()["x"], 1.5);
    assert!(r.milliers());
    assert_eq!(r.notation(), Notation::Engineering);
    assert_eq!(r.precision(), Some(4));

    // la forme héritée est reconstruite en texte "a op b"
    assert_eq!(r.historique()[0].texte, "2 + 3");
    assert_eq!(r.historique()[0].resultat, Some(5.0));
    assert_eq!(r.historique()[1].texte, "1 / 0");
    assert_eq!(r.historique()[1].resultat, None);
    assert_eq!(r.historique()[2].texte, "5 * 2");
    assert_eq!(r.historique()[2].resultat, Some(10.0));

    assert_eq!(r.dernier(), Some(10.0));
    assert_eq!(r.refaire_disponibles(), 0);
}

#[test]
fn heritee_et_actuelle_se_rendent_identiquement() {
    let heritee = charger_texte(
        r#"{"history": [{"op": "+", "a": 2, "b": 3, "result": 5}]}"#,
    )
    .expect("charger_texte");
    let actuelle = charger_texte(
        r#"{"history": [{"expr": "2 + 3", "result": 5}]}"#,
    )
    .expect("charger_texte");

    assert_eq!(
        heritee.historique()[0].texte,
        actuelle.historique()[0].texte
    );
    assert_eq!(
        heritee.historique()[0].resultat,
        actuelle.historique()[0].resultat
    );
}

/* ------------------------ Défauts sûrs ------------------------ */

#[test]
fn champs_absents_defauts_surs() {
    let r = charger_texte(r#"{"memory": 1.5}"#).expect("charger_texte");
    assert_eq!(r.memoire_rappel(), 1.5);
    assert!(r.vars().is_empty());
    assert!(r.historique().is_empty());
    assert_eq!(r.precision(), None);
    assert_eq!(r.notation(), Notation::Plain);
    assert!(!r.mode_decimal());
    assert!(!r.milliers());
    assert_eq!(r.dernier(), None);

    let vide = charger_texte("{}").expect("document vide");
    assert_eq!(vide.memoire_rappel(), 0.0);
}

#[test]
fn precision_hors_plage_desactivee() {
    let r = charger_texte(r#"{"precision": 99}"#).expect("charger_texte");
    assert_eq!(r.precision(), None);
    let r = charger_texte(r#"{"precision": -3}"#).expect("charger_texte");
    assert_eq!(r.precision(), None);
    let r = charger_texte(r#"{"precision": null}"#).expect("charger_texte");
    assert_eq!(r.precision(), None);
}

#[test]
fn vars_reservees_ou_majuscules_normalisees() {
    let r = charger_texte(r#"{"vars": {"ans": 1, "MEM": 2, "Y": 3}}"#).expect("charger_texte");
    assert_eq!(r.vars().len(), 1);
    assert_eq!(r.vars()["y"], 3.0);
}

#[test]
fn journal_borne_au_chargement() {
    let mut entrees = Vec::new();
    for k in 0..(super::etat::HISTORIQUE_MAX + 50) {
        entrees.push(format!(r#"{{"expr": "{k}+0", "result": {k}}}"#));
    }
    let texte = format!(r#"{{"history": [{}]}}"#, entrees.join(","));

    let r = charger_texte(&texte).expect("charger_texte");
    assert_eq!(r.historique().len(), super::etat::HISTORIQUE_MAX);
    // ce sont les plus récentes qui survivent
    assert_eq!(r.historique()[0].texte, "50+0");
}

/* ------------------------ Erreurs distinguées ------------------------ */

#[test]
fn fichier_absent_erreur_io() {
    let chemin = chemin_temp("inexistant");
    let _ = fs::remove_file(&chemin);
    assert!(matches!(
        charger(&chemin),
        Err(ErreurPersistance::Io(_))
    ));
}

#[test]
fn document_corrompu_erreur_format() {
    let chemin = chemin_temp("corrompu");
    fs::write(&chemin, "ceci n'est pas du json").expect("écrire");
    let r = charger(&chemin);
    let _ = fs::remove_file(&chemin);
    assert!(matches!(r, Err(ErreurPersistance::Format(_))));
}

/* ------------------------ Non-finis élagués ------------------------ */

#[test]
fn non_finis_elagues_a_l_enregistrement() {
    use std::time::SystemTime;

    let mut s = EtatSession::new();
    s.memoire = f64::INFINITY;
    s.vars.insert("bon".into(), 1.0);
    s.vars.insert("mauvais".into(), f64::NAN);
    s.historique.push(super::etat::Enregistrement {
        texte: "exp(1000)".into(),
        resultat: Some(f64::INFINITY),
        horodatage: SystemTime::now(),
    });

    let chemin = chemin_temp("non-finis");
    sauver(&s, &chemin).expect("sauver");
    let r = charger(&chemin).expect("charger");
    let _ = fs::remove_file(&chemin);

    assert_eq!(r.memoire_rappel(), 0.0);
    assert_eq!(r.vars().len(), 1);
    assert_eq!(r.vars()["bon"], 1.0);
    assert_eq!(r.historique()[0].resultat, None);
}
