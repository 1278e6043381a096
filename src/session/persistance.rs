// src/session/persistance.rs
//
// Codec de persistance : EtatSession <-> document JSON lisible.
//
// Le document disque est un contrat séparé de l'état mémoire :
// - clés stables (memory, vars, decimal, format_thousands, format_notation,
//   precision, history)
// - entrées d'historique sous DEUX formes, l'actuelle { expr, result } et
//   l'héritée { op, a, b, result }, distinguées par présence de champs (les
//   anciens fichiers ne portent pas d'étiquette de version) et normalisées
//   à la lecture
// - tout champ optionnel absent prend un défaut sûr, la lecture n'échoue
//   que sur un document illisible
// - la pile refaire n'est JAMAIS persistée : une session rechargée repart
//   avec une pile vide (limitation connue et assumée)
//
// JSON n'a ni NaN ni infini : à l'écriture, un résultat non fini devient
// null, une variable non finie est exclue, une mémoire non finie repart à 0
// (chacun avec un avertissement).

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::etat::{Enregistrement, EtatSession, HISTORIQUE_MAX, PRECISION_MAX};
use crate::noyau::format::Notation;

/// Erreur de persistance. Io = "le disque est injoignable",
/// Format = "le document est corrompu" ; le front-end les distingue.
#[derive(Debug, thiserror::Error)]
pub enum ErreurPersistance {
    #[error("entrée/sortie: {0}")]
    Io(#[from] std::io::Error),

    #[error("format invalide: {0}")]
    Format(#[from] serde_json::Error),
}

/* ------------------------ Formes disque ------------------------ */

#[derive(Debug, Serialize, Deserialize)]
struct Document {
    #[serde(default)]
    memory: f64,
    #[serde(default)]
    vars: HashMap<String, f64>,
    #[serde(default)]
    decimal: bool,
    #[serde(default)]
    format_thousands: bool,
    #[serde(default)]
    format_notation: Notation,
    #[serde(default)]
    precision: Option<i64>,
    #[serde(default)]
    history: Vec<EntreeHistorique>,
}

/// Somme explicite des deux formes d'entrée d'historique.
#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum EntreeHistorique {
    Actuelle {
        expr: String,
        result: Option<f64>,
    },
    Heritee {
        op: String,
        a: f64,
        b: f64,
        result: Option<f64>,
    },
}

impl EntreeHistorique {
    /// Normalise vers la forme mémoire. La forme héritée est reconstruite
    /// en texte ("a op b") et se rend ensuite exactement comme une entrée
    /// actuelle équivalente.
    fn normaliser(self, horodatage: SystemTime) -> Enregistrement {
        match self {
            EntreeHistorique::Actuelle { expr, result } => Enregistrement {
                texte: expr,
                resultat: result,
                horodatage,
            },
            EntreeHistorique::Heritee { op, a, b, result } => Enregistrement {
                texte: format!("{a} {op} {b}"),
                resultat: result,
                horodatage,
            },
        }
    }
}

/* ------------------------ Écriture ------------------------ */

/// Écrit la session sur disque.
pub fn sauver(etat: &EtatSession, chemin: &Path) -> Result<(), ErreurPersistance> {
    let doc = vers_document(etat);
    let texte = serde_json::to_string_pretty(&doc)?;
    fs::write(chemin, texte)?;
    info!(
        chemin = %chemin.display(),
        entrees = doc.history.len(),
        "session enregistrée"
    );
    Ok(())
}

fn vers_document(etat: &EtatSession) -> Document {
    let memory = if etat.memoire.is_finite() {
        etat.memoire
    } else {
        warn!("mémoire non finie, remise à 0 à l'enregistrement");
        0.0
    };

    let mut vars = HashMap::new();
    for (nom, v) in &etat.vars {
        if v.is_finite() {
            vars.insert(nom.clone(), *v);
        } else {
            warn!(nom = %nom, "variable non finie, exclue de l'enregistrement");
        }
    }

    let history = etat
        .historique
        .iter()
        .map(|e| EntreeHistorique::Actuelle {
            expr: e.texte.clone(),
            result: e.resultat.filter(|v| v.is_finite()),
        })
        .collect();

    Document {
        memory,
        vars,
        decimal: etat.mode_decimal,
        format_thousands: etat.milliers,
        format_notation: etat.notation,
        precision: etat.precision.map(|p| p as i64),
        history,
    }
}

/* ------------------------ Lecture ------------------------ */

/// Lit une session depuis le disque. Un fichier absent est une ErreurIo ;
/// au caller de décider si c'est "première session" ou une vraie panne.
pub fn charger(chemin: &Path) -> Result<EtatSession, ErreurPersistance> {
    let texte = fs::read_to_string(chemin)?;
    let etat = charger_texte(&texte)?;
    info!(
        chemin = %chemin.display(),
        entrees = etat.historique().len(),
        "session chargée"
    );
    Ok(etat)
}

/// Décode un document JSON (séparé de l'I/O pour les tests).
pub(crate) fn charger_texte(texte: &str) -> Result<EtatSession, ErreurPersistance> {
    let doc: Document = serde_json::from_str(texte)?;
    Ok(depuis_document(doc))
}

fn depuis_document(doc: Document) -> EtatSession {
    // précision hors plage : désactivée, la lecture n'échoue pas
    let precision = match doc.precision {
        Some(n) if (0..=PRECISION_MAX).contains(&n) => Some(n as u8),
        Some(n) => {
            warn!(valeur = n, "précision hors plage dans le fichier, désactivée");
            None
        }
        None => None,
    };

    // clés normalisées en minuscules ; ans/mem ne sont jamais des variables
    let mut vars = HashMap::new();
    for (nom, v) in doc.vars {
        let nom = nom.to_lowercase();
        if nom == "ans" || nom == "mem" {
            warn!(nom = %nom, "nom réservé ignoré parmi les variables du fichier");
            continue;
        }
        vars.insert(nom, v);
    }

    if doc
        .history
        .iter()
        .any(|e| matches!(e, EntreeHistorique::Heritee { .. }))
    {
        info!("entrées d'historique au format hérité, normalisées");
    }

    // l'horodatage n'est pas persisté : les entrées rechargées sont datées
    // du chargement
    let maintenant = SystemTime::now();
    let mut historique: Vec<Enregistrement> = doc
        .history
        .into_iter()
        .map(|e| e.normaliser(maintenant))
        .collect();

    // borne du journal : on garde les plus récentes
    if historique.len() > HISTORIQUE_MAX {
        historique.drain(0..historique.len() - HISTORIQUE_MAX);
    }

    // le fichier ne porte pas ans : recalculé depuis le sommet du journal
    // (même règle que l'annulation)
    let dernier = historique.last().and_then(|e| e.resultat);

    EtatSession {
        memoire: doc.memory,
        vars,
        dernier,
        historique,
        refaire: Vec::new(),
        precision,
        mode_decimal: doc.decimal,
        milliers: doc.format_thousands,
        notation: doc.format_notation,
    }
}
