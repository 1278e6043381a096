// src/session/etat.rs
//
// État de session + machine à états.
//
// Rôle : posséder l'état mutable (mémoire, variables, ans, journal des
// calculs, piles annuler/rétablir, préférences) et n'exposer que des
// opérations atomiques : chaque opération réussit entièrement ou laisse
// l'état strictement inchangé.
//
// Contrats :
// - Aucune évaluation ici sans passer par le noyau (parser -> valider ->
//   evaluer) ; le noyau ne voit qu'une table de symboles jetable.
// - Toute entrée ajoutée au journal vide atomiquement la pile refaire.
// - annuler/rétablir ne portent QUE sur le journal des calculs : les
//   mutations de mémoire et de variables sont hors du périmètre
//   transactionnel, c'est documenté et voulu.
// - Pas d'état global : chaque session est une valeur indépendante,
//   construite fraîche ou chargée du disque.

use std::collections::HashMap;
use std::time::SystemTime;

use tracing::debug;

use crate::noyau::eval::{evaluer, ErreurEval, Mode, TableSymboles, Valeur};
use crate::noyau::format::{formater_valeur, Affichage, Notation};
use crate::noyau::jetons::ErreurSyntaxe;
use crate::noyau::rpn::parser;
use crate::noyau::valide::{valider, ErreurValidation};

/// Garde-fou : borne du journal (les plus anciennes entrées tombent).
pub const HISTORIQUE_MAX: usize = 200;

/// Précision d'affichage maximale réglable.
pub const PRECISION_MAX: i64 = 12;

/// Une entrée du journal des calculs. Immuable une fois créée ;
/// `resultat: None` encode "indéfini" (division par zéro).
/// L'horodatage est mémoire seulement, il n'est pas persisté.
#[derive(Clone, Debug, PartialEq)]
pub struct Enregistrement {
    pub texte: String,
    pub resultat: Option<f64>,
    pub horodatage: SystemTime,
}

/// Issue d'une ligne acceptée.
#[derive(Clone, Debug, PartialEq)]
pub enum Sortie {
    /// Ligne blanche : no-op.
    Ignoree,
    /// Expression évaluée ; ans a avancé, le journal a gagné une entrée.
    Evaluee(Valeur),
    /// Division par zéro : entrée "indéfini" au journal, ans inchangé.
    Indefinie,
    /// Affectation `nom = expr` ; ni journal, ni ans, ni refaire touchés.
    Affectee { nom: String, valeur: Valeur },
}

/// Erreur d'une ligne refusée ; l'état n'a pas bougé.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ErreurLigne {
    #[error(transparent)]
    Syntaxe(#[from] ErreurSyntaxe),

    #[error(transparent)]
    Validation(#[from] ErreurValidation),

    #[error(transparent)]
    Eval(#[from] ErreurEval),

    #[error("nom réservé: {0}")]
    NomReserve(String),
}

/// Erreur de précondition d'une opération de session ; l'état n'a pas bougé.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ErreurSession {
    #[error("historique vide")]
    HistoriqueVide,

    #[error("rien à rétablir")]
    RefaireVide,

    #[error("aucun résultat précédent")]
    AucunResultat,

    #[error("précision hors plage (0 à 12, ou off): {0}")]
    PrecisionHorsPlage(i64),
}

/// L'agrégat mutable d'une session de calculatrice.
#[derive(Clone, Debug, Default)]
pub struct EtatSession {
    pub(crate) memoire: f64,
    pub(crate) vars: HashMap<String, f64>,
    pub(crate) dernier: Option<f64>,
    pub(crate) historique: Vec<Enregistrement>,
    pub(crate) refaire: Vec<Enregistrement>,
    pub(crate) precision: Option<u8>,
    pub(crate) mode_decimal: bool,
    pub(crate) milliers: bool,
    pub(crate) notation: Notation,
}

impl EtatSession {
    pub fn new() -> Self {
        Self::default()
    }

    /* ------------------------ Lectures ------------------------ */

    pub fn dernier(&self) -> Option<f64> {
        self.dernier
    }

    pub fn memoire_rappel(&self) -> f64 {
        self.memoire
    }

    pub fn vars(&self) -> &HashMap<String, f64> {
        &self.vars
    }

    pub fn historique(&self) -> &[Enregistrement] {
        &self.historique
    }

    pub fn refaire_disponibles(&self) -> usize {
        self.refaire.len()
    }

    pub fn precision(&self) -> Option<u8> {
        self.precision
    }

    pub fn mode_decimal(&self) -> bool {
        self.mode_decimal
    }

    pub fn milliers(&self) -> bool {
        self.milliers
    }

    pub fn notation(&self) -> Notation {
        self.notation
    }

    /// Préférences d'affichage courantes.
    pub fn affichage(&self) -> Affichage {
        Affichage {
            precision: self.precision,
            milliers: self.milliers,
            notation: self.notation,
        }
    }

    /// Rend une valeur selon les préférences de la session.
    pub fn formater(&self, v: &Valeur) -> String {
        formater_valeur(v, &self.affichage())
    }

    fn mode(&self) -> Mode {
        if self.mode_decimal {
            Mode::Decimal
        } else {
            Mode::Flottant
        }
    }

    /// Table de symboles d'une évaluation : réservés (ans, mem) >
    /// variables > constantes (mode flottant seulement).
    fn table_symboles(&self) -> TableSymboles<'_> {
        TableSymboles::new(self.dernier, self.memoire, &self.vars, !self.mode_decimal)
    }

    /* ------------------------ Une ligne ------------------------ */

    /// Accepte une ligne du protocole : blanche (no-op), affectation
    /// `nom = expr`, ou expression.
    pub fn evaluer_ligne(&mut self, texte: &str) -> Result<Sortie, ErreurLigne> {
        if texte.trim().is_empty() {
            return Ok(Sortie::Ignoree);
        }

        // affectation ? (un '=' dont la gauche n'est pas un identifiant
        // retombe dans le parseur, qui refuse '=' avec sa position)
        if let Some((gauche, droite)) = texte.split_once('=') {
            if est_identifiant(gauche.trim()) {
                return self.affecter(gauche, droite, texte);
            }
        }

        let expr = parser(texte)?;
        valider(&expr)?;

        match evaluer(&expr, &self.table_symboles(), self.mode()) {
            Ok(valeur) => {
                let f = valeur.comme_f64();
                debug!(ligne = texte.trim(), resultat = f, "évaluation");
                self.consigner(texte.trim().to_string(), Some(f));
                self.dernier = Some(f);
                Ok(Sortie::Evaluee(valeur))
            }

            // erreur métier, pas une faute : la tentative reste au journal
            // ("indéfini"), ans n'avance pas
            Err(ErreurEval::DivisionParZero) => {
                debug!(ligne = texte.trim(), "division par zéro, consignée indéfinie");
                self.consigner(texte.trim().to_string(), None);
                Ok(Sortie::Indefinie)
            }

            Err(e) => Err(e.into()),
        }
    }

    fn affecter(&mut self, gauche: &str, droite: &str, ligne: &str) -> Result<Sortie, ErreurLigne> {
        let nom = gauche.trim().to_lowercase();

        // réservés, refusés avant d'évaluer quoi que ce soit
        if nom == "ans" || nom == "mem" {
            return Err(ErreurLigne::NomReserve(nom));
        }

        // les positions d'erreur restent relatives à la ligne entière
        let decalage = ligne.chars().count() - droite.chars().count();
        let expr = parser(droite).map_err(|mut e| {
            e.pos += decalage;
            e
        })?;
        valider(&expr)?;

        let valeur = evaluer(&expr, &self.table_symboles(), self.mode())?;
        let f = valeur.comme_f64();
        self.vars.insert(nom.clone(), f);
        debug!(nom = %nom, valeur = f, "affectation");

        // ni journal, ni ans, ni refaire : l'affectation est hors du
        // périmètre annuler/rétablir
        Ok(Sortie::Affectee { nom, valeur })
    }

    /// Ajoute au journal. Invariant : tout ajout vide la pile refaire.
    fn consigner(&mut self, texte: String, resultat: Option<f64>) {
        if self.historique.len() >= HISTORIQUE_MAX {
            self.historique.remove(0);
        }
        self.historique.push(Enregistrement {
            texte,
            resultat,
            horodatage: SystemTime::now(),
        });
        self.refaire.clear();
    }

    /* ------------------------ Annuler / rétablir ------------------------ */

    /// Retire la dernière entrée du journal (vers la pile refaire) et
    /// recale ans sur le nouveau sommet, y compris None si ce sommet est
    /// "indéfini" : pas de saut d'entrées.
    pub fn annuler(&mut self) -> Result<Enregistrement, ErreurSession> {
        let e = self.historique.pop().ok_or(ErreurSession::HistoriqueVide)?;
        self.refaire.push(e.clone());
        self.dernier = self.historique.last().and_then(|x| x.resultat);
        Ok(e)
    }

    /// Inverse d'annuler. L'entrée est rejouée comme l'évaluation d'origine:
    /// un résultat Some avance ans, un "indéfini" le laisse en place
    /// (annuler puis rétablir doit être neutre).
    pub fn retablir(&mut self) -> Result<Enregistrement, ErreurSession> {
        let e = self.refaire.pop().ok_or(ErreurSession::RefaireVide)?;
        if self.historique.len() >= HISTORIQUE_MAX {
            self.historique.remove(0);
        }
        self.historique.push(e.clone());
        if let Some(v) = e.resultat {
            self.dernier = Some(v);
        }
        Ok(e)
    }

    /* ------------------------ Mémoire ------------------------ */

    /// M+ : ajoute ans à la mémoire. Sans résultat précédent, la mémoire
    /// n'est pas touchée.
    pub fn memoire_ajouter(&mut self) -> Result<f64, ErreurSession> {
        let v = self.dernier.ok_or(ErreurSession::AucunResultat)?;
        self.memoire += v;
        Ok(self.memoire)
    }

    /// M- : retranche ans de la mémoire.
    pub fn memoire_soustraire(&mut self) -> Result<f64, ErreurSession> {
        let v = self.dernier.ok_or(ErreurSession::AucunResultat)?;
        self.memoire -= v;
        Ok(self.memoire)
    }

    /* ------------------------ Préférences ------------------------ */

    /// 0 à 12 décimales, ou None pour "off". Hors plage : refusé sans
    /// changement d'état.
    pub fn fixer_precision(&mut self, p: Option<i64>) -> Result<(), ErreurSession> {
        match p {
            None => {
                self.precision = None;
                Ok(())
            }
            Some(n) if (0..=PRECISION_MAX).contains(&n) => {
                self.precision = Some(n as u8);
                Ok(())
            }
            Some(n) => Err(ErreurSession::PrecisionHorsPlage(n)),
        }
    }

    pub fn fixer_mode_decimal(&mut self, actif: bool) {
        self.mode_decimal = actif;
    }

    pub fn fixer_milliers(&mut self, actif: bool) {
        self.milliers = actif;
    }

    pub fn fixer_notation(&mut self, notation: Notation) {
        self.notation = notation;
    }
}

/// `[a-zA-Z_][a-zA-Z0-9_]*`, la forme qu'accepte aussi le lexeur.
fn est_identifiant(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
