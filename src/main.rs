// src/main.rs
//
// Calculatrice Session : front-end REPL minimal
// ---------------------------------------------
// Rôle:
// - une ligne lue = un appel à la session (protocole ligne)
// - les lignes ':xxx' sont des commandes, mappées une-pour-une sur les
//   opérations de session ; tout le reste part dans evaluer_ligne
// - chargement au démarrage, enregistrement sur :sauver / :quitter / EOF
//
// Toute la logique vit dans la bibliothèque ; ici on ne fait qu'afficher
// les issues et les erreurs (messages rendus tels quels).

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

use calculatrice_session::noyau::{ErreurSyntaxe, Notation};
use calculatrice_session::session::{self, ErreurLigne, ErreurPersistance, EtatSession, Sortie};

/// Chemin du fichier de session : 1er argument, sinon variable
/// d'environnement, sinon le défaut.
const ENV_CHEMIN: &str = "CALCULATRICE_SESSION";
const CHEMIN_DEFAUT: &str = "calculatrice-session.json";

const AIDE: &str = "\
commandes :
  :m+           ajoute ans à la mémoire
  :m-           retranche ans de la mémoire
  :mr           rappelle la mémoire
  :annuler      retire le dernier calcul du journal
  :retablir     rejoue le dernier calcul annulé
  :precision N  0 à 12 décimales, ou 'off'
  :decimal on|off    backend décimal exact (opérateurs seulement)
  :milliers on|off   groupement des milliers
  :notation plain|sci|eng
  :historique   liste le journal des calculs
  :vars         liste les variables
  :sauver       enregistre la session maintenant
  :quitter      enregistre puis quitte
tout le reste est évalué : 2+3*4, x = sqrt(16)/2, (1+ans)*mem, ...";

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let chemin = chemin_session();

    let mut etat = match session::charger(&chemin) {
        Ok(etat) => etat,
        Err(ErreurPersistance::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
            // première session : rien à charger
            EtatSession::new()
        }
        Err(e) => {
            // seule voie fatale : le disque ou le document, pas une entrée
            eprintln!("! impossible de charger {}: {e}", chemin.display());
            return ExitCode::FAILURE;
        }
    };

    let stdin = io::stdin();
    let mut lignes = stdin.lock().lines();

    loop {
        print!("> ");
        let _ = io::stdout().flush();

        let ligne = match lignes.next() {
            Some(Ok(l)) => l,
            Some(Err(e)) => {
                eprintln!("! lecture: {e}");
                break;
            }
            None => break, // EOF
        };

        let coupe = ligne.trim();
        if let Some(cmd) = coupe.strip_prefix(':') {
            if !commande(cmd, &mut etat, &chemin) {
                break;
            }
            continue;
        }

        // le résultat n'emprunte pas l'état : on peut formater juste après
        match etat.evaluer_ligne(&ligne) {
            Ok(Sortie::Ignoree) => {}
            Ok(Sortie::Evaluee(v)) => println!("= {}", etat.formater(&v)),
            Ok(Sortie::Indefinie) => println!("= indéfini"),
            Ok(Sortie::Affectee { nom, valeur }) => {
                println!("{nom} = {}", etat.formater(&valeur));
            }
            Err(ErreurLigne::Syntaxe(e)) => marquer(&ligne, &e),
            Err(e) => eprintln!("! {e}"),
        }
    }

    match session::sauver(&etat, &chemin) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("! impossible d'enregistrer {}: {e}", chemin.display());
            ExitCode::FAILURE
        }
    }
}

fn chemin_session() -> PathBuf {
    if let Some(arg) = std::env::args().nth(1) {
        return PathBuf::from(arg);
    }
    if let Ok(env) = std::env::var(ENV_CHEMIN) {
        return PathBuf::from(env);
    }
    PathBuf::from(CHEMIN_DEFAUT)
}

/// Exécute une commande ':xxx'. Retourne false pour quitter.
fn commande(cmd: &str, etat: &mut EtatSession, chemin: &std::path::Path) -> bool {
    let mut mots = cmd.split_whitespace();
    let nom = mots.next().unwrap_or("");
    let arg = mots.next();

    match (nom, arg) {
        ("aide", _) | ("help", _) => println!("{AIDE}"),

        ("m+", _) => selon(etat.memoire_ajouter().map(|m| format!("mémoire = {m}"))),
        ("m-", _) => selon(etat.memoire_soustraire().map(|m| format!("mémoire = {m}"))),
        ("mr", _) => println!("mémoire = {}", etat.memoire_rappel()),

        ("annuler", _) | ("undo", _) => {
            selon(etat.annuler().map(|e| format!("annulé : {}", e.texte)))
        }
        ("retablir", _) | ("redo", _) => {
            selon(etat.retablir().map(|e| format!("rétabli : {}", e.texte)))
        }

        ("precision", Some("off")) => selon(etat.fixer_precision(None).map(|_| "précision off".to_string())),
        ("precision", Some(n)) => match n.parse::<i64>() {
            Ok(n) => selon(etat.fixer_precision(Some(n)).map(|_| format!("précision {n}"))),
            Err(_) => println!("usage : :precision N (0 à 12) | off"),
        },
        ("precision", None) => println!("usage : :precision N (0 à 12) | off"),

        ("decimal", Some(v)) => match bascule(v) {
            Some(actif) => {
                etat.fixer_mode_decimal(actif);
                println!("mode décimal {}", si(actif));
            }
            None => println!("usage : :decimal on|off"),
        },
        ("milliers", Some(v)) => match bascule(v) {
            Some(actif) => {
                etat.fixer_milliers(actif);
                println!("milliers {}", si(actif));
            }
            None => println!("usage : :milliers on|off"),
        },
        ("notation", Some(v)) => {
            let notation = match v {
                "plain" => Some(Notation::Plain),
                "sci" | "scientific" => Some(Notation::Scientific),
                "eng" | "engineering" => Some(Notation::Engineering),
                _ => None,
            };
            match notation {
                Some(n) => {
                    etat.fixer_notation(n);
                    println!("notation {v}");
                }
                None => println!("usage : :notation plain|sci|eng"),
            }
        }
        ("decimal", None) => println!("usage : :decimal on|off"),
        ("milliers", None) => println!("usage : :milliers on|off"),
        ("notation", None) => println!("usage : :notation plain|sci|eng"),

        ("historique", _) => {
            for (k, e) in etat.historique().iter().enumerate() {
                match e.resultat {
                    Some(v) => println!("{:>3}  {}  =  {v}", k + 1, e.texte),
                    None => println!("{:>3}  {}  =  indéfini", k + 1, e.texte),
                }
            }
        }
        ("vars", _) => {
            let mut noms: Vec<_> = etat.vars().keys().collect();
            noms.sort();
            for nom in noms {
                println!("{nom} = {}", etat.vars()[nom]);
            }
        }

        ("sauver", _) => match session::sauver(etat, chemin) {
            Ok(()) => println!("session enregistrée : {}", chemin.display()),
            Err(e) => eprintln!("! impossible d'enregistrer : {e}"),
        },

        ("quitter", _) | ("quit", _) => return false,

        _ => println!("commande inconnue (:aide pour la liste)"),
    }
    true
}

fn bascule(v: &str) -> Option<bool> {
    match v {
        "on" => Some(true),
        "off" => Some(false),
        _ => None,
    }
}

fn si(actif: bool) -> &'static str {
    if actif {
        "activé"
    } else {
        "désactivé"
    }
}

fn selon<T: std::fmt::Display, E: std::fmt::Display>(r: Result<T, E>) {
    match r {
        Ok(v) => println!("{v}"),
        Err(e) => eprintln!("! {e}"),
    }
}

/// Curseur sous la position fautive (positions en caractères).
fn marquer(ligne: &str, erreur: &ErreurSyntaxe) {
    eprintln!("! {erreur}");
    eprintln!("  {ligne}");
    let nb = ligne.chars().count();
    let pos = erreur.pos.min(nb);
    eprintln!("  {}^", " ".repeat(pos));
}
