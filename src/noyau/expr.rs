// src/noyau/expr.rs
//
// AST restreint : exactement cinq formes de nœud, rien d'autre n'est
// constructible. C'est le contrat de bac-à-sable : l'enum est fermé, et
// chaque passe (validation, évaluation) fait un match exhaustif dessus.
//
// - Nombre : littéral, texte source conservé (le backend décimal exact le
//   relit sans jamais passer par un flottant binaire)
// - Ident  : identifiant en minuscules (variable, ans/mem, constante)
// - Unaire : +x / -x
// - Binaire: + - * / ** % //
// - Appel  : fonction de la liste blanche, arguments positionnels
//
// Un arbre est construit à chaque ligne puis jeté : jamais de cache
// inter-lignes, re-parser est bon marché et aucun nœud ne peut porter un
// état périmé.

use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OpUnaire {
    Plus,
    Moins,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OpBinaire {
    Add,      // +
    Sub,      // -
    Mul,      // *
    Div,      // /
    Pow,      // **
    Rem,      // %  (signe du diviseur)
    FloorDiv, // // (plancher)
}

impl fmt::Display for OpUnaire {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpUnaire::Plus => write!(f, "+"),
            OpUnaire::Moins => write!(f, "-"),
        }
    }
}

impl fmt::Display for OpBinaire {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpBinaire::Add => write!(f, "+"),
            OpBinaire::Sub => write!(f, "-"),
            OpBinaire::Mul => write!(f, "*"),
            OpBinaire::Div => write!(f, "/"),
            OpBinaire::Pow => write!(f, "**"),
            OpBinaire::Rem => write!(f, "%"),
            OpBinaire::FloorDiv => write!(f, "//"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Expr {
    Nombre(String),
    Ident(String),
    Unaire(OpUnaire, Box<Expr>),
    Binaire(OpBinaire, Box<Expr>, Box<Expr>),
    Appel(String, Vec<Expr>),
}

/* ------------------------ Affichage debug (pas "joli" final) ------------------------ */

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Nombre(t) => write!(f, "{t}"),
            Expr::Ident(n) => write!(f, "{n}"),
            Expr::Unaire(op, x) => write!(f, "({op}{x})"),
            Expr::Binaire(op, a, b) => write!(f, "({a}{op}{b})"),
            Expr::Appel(nom, args) => {
                write!(f, "{nom}(")?;
                for (k, a) in args.iter().enumerate() {
                    if k > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{a}")?;
                }
                write!(f, ")")
            }
        }
    }
}
