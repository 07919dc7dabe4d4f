// src/image/players.rs
// Curated editorial photos for star athletes, used when an article has no usable image.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerEntry {
    /// Lowercase substrings matched against the title.
    pub keywords: &'static [&'static str],
    pub image_url: &'static str,
    pub display_name: &'static str,
}

pub const PLAYER_LIBRARY: &[PlayerEntry] = &[
    // soccer
    PlayerEntry {
        display_name: "Lionel Messi",
        keywords: &["messi", "leo messi", "lionel messi"],
        image_url: "https://a1.espncdn.com/combiner/i?img=%2Fphoto%2F2024%2F0613%2Fr1345073_1296x729_16%2D9.jpg",
    },
    PlayerEntry {
        display_name: "Cristiano Ronaldo",
        keywords: &["ronaldo", "cristiano", "cr7"],
        image_url: "https://a3.espncdn.com/combiner/i?img=%2Fphoto%2F2024%2F0617%2Fr1348091_1296x729_16%2D9.jpg",
    },
    PlayerEntry {
        display_name: "Kylian Mbappé",
        keywords: &["mbappe", "mbappé", "kylian"],
        image_url: "https://a2.espncdn.com/combiner/i?img=%2Fphoto%2F2024%2F0603%2Fr1340651_1296x729_16%2D9.jpg",
    },
    PlayerEntry {
        display_name: "Vinícius Jr",
        keywords: &["vinicius", "vinícius", "vini jr", "vini"],
        image_url: "https://a4.espncdn.com/combiner/i?img=%2Fphoto%2F2024%2F1028%2Fr1402899_1296x729_16%2D9.jpg",
    },
    PlayerEntry {
        display_name: "Erling Haaland",
        keywords: &["haaland", "erling"],
        image_url: "https://a1.espncdn.com/combiner/i?img=%2Fphoto%2F2024%2F0914%2Fr1380934_1296x729_16%2D9.jpg",
    },
    PlayerEntry {
        display_name: "Jude Bellingham",
        keywords: &["bellingham", "jude"],
        image_url: "https://a3.espncdn.com/combiner/i?img=%2Fphoto%2F2024%2F0614%2Fr1345653_1296x729_16%2D9.jpg",
    },
    PlayerEntry {
        display_name: "Lamine Yamal",
        keywords: &["yamal", "lamine"],
        image_url: "https://a2.espncdn.com/combiner/i?img=%2Fphoto%2F2024%2F0714%2Fr1357225_1296x729_16%2D9.jpg",
    },
    PlayerEntry {
        display_name: "Mohamed Salah",
        keywords: &["salah", "mohamed salah"],
        image_url: "https://a4.espncdn.com/combiner/i?img=%2Fphoto%2F2024%2F1019%2Fr1399917_1296x729_16%2D9.jpg",
    },
    PlayerEntry {
        display_name: "Robert Lewandowski",
        keywords: &["lewandowski", "lewy"],
        image_url: "https://a1.espncdn.com/combiner/i?img=%2Fphoto%2F2024%2F1026%2Fr1402041_1296x729_16%2D9.jpg",
    },
    PlayerEntry {
        display_name: "Harry Kane",
        keywords: &["kane", "harry kane"],
        image_url: "https://a3.espncdn.com/combiner/i?img=%2Fphoto%2F2024%2F0928%2Fr1386839_1296x729_16%2D9.jpg",
    },
    // NBA
    PlayerEntry {
        display_name: "LeBron James",
        keywords: &["lebron", "james", "lakers"],
        image_url: "https://a4.espncdn.com/combiner/i?img=%2Fphoto%2F2024%2F1105%2Fr1407209_1296x729_16%2D9.jpg",
    },
    PlayerEntry {
        display_name: "Stephen Curry",
        keywords: &["curry", "steph", "warriors"],
        image_url: "https://a2.espncdn.com/combiner/i?img=%2Fphoto%2F2024%2F1030%2Fr1404389_1296x729_16%2D9.jpg",
    },
    PlayerEntry {
        display_name: "Luka Dončić",
        keywords: &["doncic", "luka", "dončić"],
        image_url: "https://a1.espncdn.com/combiner/i?img=%2Fphoto%2F2024%2F0613%2Fr1345169_1296x729_16%2D9.jpg",
    },
    PlayerEntry {
        display_name: "Giannis Antetokounmpo",
        keywords: &["giannis", "antetokounmpo", "bucks"],
        image_url: "https://a3.espncdn.com/combiner/i?img=%2Fphoto%2F2024%2F1022%2Fr1400847_1296x729_16%2D9.jpg",
    },
    PlayerEntry {
        display_name: "Victor Wembanyama",
        keywords: &["wembanyama", "wemby", "victor"],
        image_url: "https://a4.espncdn.com/combiner/i?img=%2Fphoto%2F2024%2F1025%2Fr1401689_1296x729_16%2D9.jpg",
    },
    PlayerEntry {
        display_name: "Nikola Jokić",
        keywords: &["jokic", "jokić", "nikola", "nuggets"],
        image_url: "https://a2.espncdn.com/combiner/i?img=%2Fphoto%2F2024%2F1028%2Fr1402901_1296x729_16%2D9.jpg",
    },
    // NFL
    PlayerEntry {
        display_name: "Patrick Mahomes",
        keywords: &["mahomes", "patrick", "chiefs"],
        image_url: "https://a1.espncdn.com/combiner/i?img=%2Fphoto%2F2024%2F0909%2Fr1378849_1296x729_16%2D9.jpg",
    },
    PlayerEntry {
        display_name: "Lamar Jackson",
        keywords: &["lamar", "jackson", "ravens"],
        image_url: "https://a3.espncdn.com/combiner/i?img=%2Fphoto%2F2024%2F1014%2Fr1397593_1296x729_16%2D9.jpg",
    },
    // F1
    PlayerEntry {
        display_name: "Max Verstappen",
        keywords: &["verstappen", "max", "red bull racing"],
        image_url: "https://a4.espncdn.com/combiner/i?img=%2Fphoto%2F2024%2F1103%2Fr1406197_1296x729_16%2D9.jpg",
    },
    PlayerEntry {
        display_name: "Lewis Hamilton",
        keywords: &["hamilton", "lewis", "ferrari f1"],
        image_url: "https://a2.espncdn.com/combiner/i?img=%2Fphoto%2F2024%2F1201%2Fr1417189_1296x729_16%2D9.jpg",
    },
    // tennis
    PlayerEntry {
        display_name: "Carlos Alcaraz",
        keywords: &["alcaraz", "carlos"],
        image_url: "https://a1.espncdn.com/combiner/i?img=%2Fphoto%2F2024%2F0714%2Fr1357155_1296x729_16%2D9.jpg",
    },
    PlayerEntry {
        display_name: "Novak Djokovic",
        keywords: &["djokovic", "novak", "nole"],
        image_url: "https://a3.espncdn.com/combiner/i?img=%2Fphoto%2F2024%2F0901%2Fr1375833_1296x729_16%2D9.jpg",
    },
    // MLB
    PlayerEntry {
        display_name: "Shohei Ohtani",
        keywords: &["ohtani", "shohei", "dodgers"],
        image_url: "https://a4.espncdn.com/combiner/i?img=%2Fphoto%2F2024%2F1029%2Fr1403489_1296x729_16%2D9.jpg",
    },
];

/// First library entry with a keyword contained in `title` (case-insensitive).
pub fn find_player(title: &str) -> Option<&'static PlayerEntry> {
    let lower = title.to_lowercase();
    PLAYER_LIBRARY
        .iter()
        .find(|p| p.keywords.iter().any(|k| lower.contains(k)))
}
