/// Short codes for the Bundesliga clubs as FBref names them.
const CLUB_ABBR: &[(&str, &str)] = &[
    ("Werder Bremen", "SVW"),
    ("Augsburg", "FCA"),
    ("Dortmund", "BVB"),
    ("Hoffenheim", "TSG"),
    ("Leverkusen", "B04"),
    ("Stuttgart", "VfB"),
    ("Wolfsburg", "WOB"),
    ("Eint Frankfurt", "SGE"),
    ("Union Berlin", "FCU"),
    ("RB Leipzig", "RBL"),
    ("Bochum", "BOC"),
    ("Darmstadt 98", "SVD"),
    ("Freiburg", "SCF"),
    ("Heidenheim", "HDH"),
    ("Köln", "KOE"),
    ("M'Gladbach", "BMG"),
    ("Bayern Munich", "FCB"),
    ("Mainz 05", "M05"),
];

/// Known clubs map to their fixed code; anything else falls back to the first
/// three characters of the name, uppercased. Two unknown clubs sharing a
/// prefix will collide.
pub fn club_abbr(club_name: &str) -> String {
    if let Some((_, abbr)) = CLUB_ABBR.iter().find(|(name, _)| *name == club_name) {
        return (*abbr).to_string();
    }
    club_name.trim().chars().take(3).collect::<String>().to_uppercase()
}
